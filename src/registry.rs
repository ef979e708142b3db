//! Live reconciliation between the binding store and the OS global
//! accelerator table.
//!
//! The registry owns the transient armed set and never persists anything.
//! Each accelerator is either armed or not; `reconcile` rebuilds the whole
//! set from a snapshot of the store. A single arm failure (key claimed by
//! another app, unmapped canonical) is logged and skipped so the rest of the
//! pass still lands.

use std::collections::HashMap;

use global_hotkey::hotkey::HotKey;
use global_hotkey::GlobalHotKeyManager;
use tracing::{debug, info, warn};

use crate::actions::{ActionExecutor, ActionKind};
use crate::keycode;
use crate::store::{ButtonId, ButtonRecord};

/// The narrow slice of the OS accelerator facility the registry needs.
/// Production uses [`GlobalHotKeyManager`]; tests substitute a fake.
pub trait AcceleratorBackend {
    fn arm(&mut self, hotkey: HotKey) -> anyhow::Result<()>;
    fn disarm(&mut self, hotkey: HotKey) -> anyhow::Result<()>;
}

impl AcceleratorBackend for GlobalHotKeyManager {
    fn arm(&mut self, hotkey: HotKey) -> anyhow::Result<()> {
        self.register(hotkey).map_err(Into::into)
    }

    fn disarm(&mut self, hotkey: HotKey) -> anyhow::Result<()> {
        self.unregister(hotkey).map_err(Into::into)
    }
}

/// Runtime-only record of an armed accelerator and the action it routes to.
#[derive(Clone, Debug)]
pub struct ArmedBinding {
    pub button: ButtonId,
    pub name: String,
    pub action: ActionKind,
    pub sound_path: Option<String>,
    hotkey: HotKey,
}

pub struct AcceleratorRegistry<B: AcceleratorBackend> {
    backend: B,
    /// canonical key -> armed binding
    armed: HashMap<String, ArmedBinding>,
    /// OS hotkey id -> canonical key, for routing fired events
    by_id: HashMap<u32, String>,
    /// True while a capture session has the OS accelerators released.
    suspended: bool,
}

impl<B: AcceleratorBackend> AcceleratorRegistry<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            armed: HashMap::new(),
            by_id: HashMap::new(),
            suspended: false,
        }
    }

    /// Rebuild the armed set from a store snapshot. TOGGLE_HOTKEYS bindings
    /// are always armed; everything else only when `enabled`.
    pub fn reconcile(&mut self, records: &[ButtonRecord], enabled: bool) {
        self.disarm_all();
        self.suspended = false;

        let mut armed_count = 0usize;
        for record in records {
            let Some(canonical) = record.shortcut_key.as_deref() else {
                continue;
            };
            if !enabled && record.action != ActionKind::ToggleHotkeys {
                continue;
            }
            let Some(code) = keycode::accelerator_code(canonical) else {
                warn!(button = %record.id, key = canonical, "unmapped shortcut key, skipping");
                continue;
            };
            let hotkey = HotKey::new(None, code);
            if let Err(e) = self.backend.arm(hotkey) {
                // Claimed by another app, or rejected by the OS. Keep going.
                warn!(button = %record.id, key = canonical, error = %e, "failed to arm accelerator");
                continue;
            }
            self.by_id.insert(hotkey.id(), canonical.to_string());
            self.armed.insert(
                canonical.to_string(),
                ArmedBinding {
                    button: record.id,
                    name: record.name.clone(),
                    action: record.action,
                    sound_path: record.sound_path.clone(),
                    hotkey,
                },
            );
            armed_count += 1;
        }
        info!(armed = armed_count, enabled, "reconciled accelerators");
    }

    /// Release every OS accelerator while keeping the armed bookkeeping, so a
    /// capture session can see raw key presses. `resume` restores the exact
    /// prior set; a store change goes through `reconcile` instead.
    pub fn suspend(&mut self) {
        if self.suspended {
            return;
        }
        for binding in self.armed.values() {
            if let Err(e) = self.backend.disarm(binding.hotkey) {
                warn!(button = %binding.button, error = %e, "failed to release accelerator");
            }
        }
        self.suspended = true;
        debug!(count = self.armed.len(), "accelerators suspended for capture");
    }

    /// Re-arm the set released by `suspend`.
    pub fn resume(&mut self) {
        if !self.suspended {
            return;
        }
        for binding in self.armed.values() {
            if let Err(e) = self.backend.arm(binding.hotkey) {
                warn!(button = %binding.button, error = %e, "failed to re-arm accelerator");
            }
        }
        self.suspended = false;
        debug!(count = self.armed.len(), "accelerators restored after capture");
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    /// Drop a single armed accelerator (unbind path).
    pub fn unregister(&mut self, canonical: &str) {
        if let Some(binding) = self.armed.remove(canonical) {
            self.by_id.remove(&binding.hotkey.id());
            if !self.suspended {
                if let Err(e) = self.backend.disarm(binding.hotkey) {
                    warn!(key = canonical, error = %e, "failed to disarm accelerator");
                }
            }
            debug!(key = canonical, button = %binding.button, "accelerator unregistered");
        }
    }

    /// Route a fired OS accelerator to the action executor. Returns the
    /// dispatched action so the caller can react to TOGGLE_HOTKEYS after
    /// dispatch has finished; the armed set is never mutated from in here.
    pub fn on_fire(
        &self,
        hotkey_id: u32,
        enabled: bool,
        executor: &mut dyn ActionExecutor,
    ) -> Option<ActionKind> {
        if self.suspended {
            return None;
        }
        let canonical = self.by_id.get(&hotkey_id)?;
        let binding = self.armed.get(canonical)?.clone();

        // A disabled non-toggle binding should not even be armed; defend in
        // depth anyway.
        if !enabled && binding.action != ActionKind::ToggleHotkeys {
            debug!(key = canonical, "fire ignored, shortcuts disabled");
            return None;
        }

        debug!(key = canonical, button = %binding.button, action = ?binding.action, "accelerator fired");
        match binding.action {
            ActionKind::PlaySound => match binding.sound_path.as_deref() {
                Some(path) => executor.execute_play(path, &binding.name),
                None => warn!(button = %binding.button, "button has no sound assigned"),
            },
            ActionKind::Stop => executor.execute_stop(),
            ActionKind::Pause => executor.execute_pause(),
            ActionKind::ToggleHotkeys => executor.execute_toggle_hotkeys(),
        }
        Some(binding.action)
    }

    /// Currently armed canonical keys, sorted for stable comparison.
    pub fn armed_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.armed.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn armed(&self, canonical: &str) -> Option<&ArmedBinding> {
        self.armed.get(canonical)
    }

    /// OS hotkey id for an armed canonical key. Lets callers without a real
    /// event stream synthesize fires.
    pub fn hotkey_id(&self, canonical: &str) -> Option<u32> {
        self.armed.get(canonical).map(|b| b.hotkey.id())
    }

    fn disarm_all(&mut self) {
        if !self.suspended {
            for binding in self.armed.values() {
                if let Err(e) = self.backend.disarm(binding.hotkey) {
                    warn!(button = %binding.button, error = %e, "failed to disarm accelerator");
                }
            }
        }
        self.armed.clear();
        self.by_id.clear();
    }
}
