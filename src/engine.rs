//! Composition root: wires the store, the accelerator registry, the enable
//! toggle and the capture dialog flow together, and enforces the single
//! live capture session.
//!
//! Ordering rules live here: persistence always completes before the
//! reconcile that reads it, and a TOGGLE_HOTKEYS fire flips the enable gate
//! only after the registry has finished dispatching.

use std::path::PathBuf;

use tracing::info;

use crate::actions::{ActionExecutor, ActionKind};
use crate::capture::{CaptureSession, CaptureState};
use crate::codec;
use crate::config::Config;
use crate::error::{Result, SoundpadError};
use crate::keycode::{self, KeyInfo};
use crate::registry::{AcceleratorBackend, AcceleratorRegistry};
use crate::store::{BindingStore, ButtonId, ButtonRecord};

/// Copied button contents. An explicit value handed around instead of a
/// process-wide "currently copied button" global.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ButtonClipboard {
    contents: Option<ClipboardEntry>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ClipboardEntry {
    pub name: String,
    pub sound_path: Option<String>,
}

impl ButtonClipboard {
    pub fn contents(&self) -> Option<&ClipboardEntry> {
        self.contents.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.contents.is_none()
    }
}

pub struct Engine<B: AcceleratorBackend> {
    store: BindingStore,
    registry: AcceleratorRegistry<B>,
    config: Config,
    config_path: PathBuf,
    clipboard: ButtonClipboard,
    capture: Option<CaptureSession>,
}

impl<B: AcceleratorBackend> Engine<B> {
    /// Build the engine and perform the startup reconciliation pass.
    pub fn new(
        store: BindingStore,
        backend: B,
        config: Config,
        config_path: PathBuf,
    ) -> Result<Self> {
        let mut engine = Self {
            store,
            registry: AcceleratorRegistry::new(backend),
            config,
            config_path,
            clipboard: ButtonClipboard::default(),
            capture: None,
        };
        engine.reconcile()?;
        Ok(engine)
    }

    pub fn store(&self) -> &BindingStore {
        &self.store
    }

    pub fn registry(&self) -> &AcceleratorRegistry<B> {
        &self.registry
    }

    pub fn clipboard(&self) -> &ButtonClipboard {
        &self.clipboard
    }

    pub fn is_enabled(&self) -> bool {
        self.config.shortcuts.enabled
    }

    /// Rebuild the armed set from the store and the current enable gate.
    pub fn reconcile(&mut self) -> Result<()> {
        let records = self.store.all()?;
        self.registry
            .reconcile(&records, self.config.shortcuts.enabled);
        Ok(())
    }

    // --- enable toggle -----------------------------------------------------

    /// Flip the process-wide enable gate. The new state is persisted first;
    /// if that write fails the armed set is left untouched and the previous
    /// state stays in effect.
    pub fn set_enabled(&mut self, enabled: bool) -> Result<()> {
        let previous = self.config.shortcuts.enabled;
        if previous == enabled {
            return Ok(());
        }
        self.config.shortcuts.enabled = enabled;
        if let Err(e) = self.config.save(&self.config_path) {
            self.config.shortcuts.enabled = previous;
            return Err(e);
        }
        info!(enabled, "hotkeys toggled");
        self.reconcile()
    }

    pub fn toggle_enabled(&mut self) -> Result<bool> {
        let next = !self.config.shortcuts.enabled;
        self.set_enabled(next)?;
        Ok(next)
    }

    // --- fired accelerators ------------------------------------------------

    /// Route a fired OS accelerator. A TOGGLE_HOTKEYS fire flips the enable
    /// gate after dispatch has returned, so the registry is never reconciled
    /// while it is handing out a binding.
    pub fn handle_fire(
        &mut self,
        hotkey_id: u32,
        executor: &mut dyn ActionExecutor,
    ) -> Result<()> {
        let enabled = self.config.shortcuts.enabled;
        let fired = self.registry.on_fire(hotkey_id, enabled, executor);
        if fired == Some(ActionKind::ToggleHotkeys) {
            self.set_enabled(!enabled)?;
        }
        Ok(())
    }

    // --- capture session ---------------------------------------------------

    /// Open a capture session for `target`. At most one session may be live;
    /// a second `start_capture` fails with `CaptureBusy`.
    pub fn start_capture(&mut self, target: ButtonId) -> Result<()> {
        if self.capture.is_some() {
            return Err(SoundpadError::CaptureBusy);
        }
        if self.store.get(target)?.is_none() {
            return Err(SoundpadError::UnknownButton {
                category: target.category,
                index: target.index,
            });
        }
        self.capture = Some(CaptureSession::start(target, &mut self.registry));
        Ok(())
    }

    /// Feed a raw key press into the live session.
    pub fn capture_key(&mut self, raw: u32) -> Result<CaptureState> {
        let session = self.capture.as_mut().ok_or(SoundpadError::CaptureIdle)?;
        Ok(session.key_pressed(raw, &self.store)?.clone())
    }

    /// Commit the staged key. On success the session ends; on failure
    /// (nothing staged, conflict, persistence) it stays open so the user can
    /// retry or cancel.
    pub fn commit_capture(&mut self) -> Result<KeyInfo> {
        let enabled = self.config.shortcuts.enabled;
        let session = self.capture.as_mut().ok_or(SoundpadError::CaptureIdle)?;
        let key = session.commit(&self.store, &mut self.registry, enabled)?;
        self.capture = None;
        Ok(key)
    }

    /// End the session without saving and restore the prior armed set.
    /// Dialog-close without an explicit cancel must land here too.
    pub fn cancel_capture(&mut self) {
        if let Some(session) = self.capture.take() {
            session.cancel(&mut self.registry);
        }
    }

    pub fn capture_state(&self) -> Option<&CaptureState> {
        self.capture.as_ref().map(|s| s.state())
    }

    // --- button lifecycle --------------------------------------------------

    /// Bind a shortcut directly from a raw key code, without the interactive
    /// flow. Used by the maintenance CLI.
    pub fn bind_button(&mut self, id: ButtonId, raw: u32) -> Result<KeyInfo> {
        let info = keycode::translate(raw).ok_or(SoundpadError::UnrecognizedKey(raw))?;
        self.store.bind(id, &info.canonical, &info.display)?;
        self.reconcile()?;
        Ok(info)
    }

    /// Clear a button's shortcut and drop its armed accelerator.
    pub fn unbind_button(&mut self, id: ButtonId) -> Result<()> {
        if let Some(key) = self.store.unbind(id)? {
            self.registry.unregister(&key);
        }
        Ok(())
    }

    /// Append a fresh button at the end of a category.
    pub fn add_button(&mut self, category: i64, name: &str) -> Result<ButtonId> {
        let next = self
            .store
            .all()?
            .iter()
            .filter(|r| r.id.category == category)
            .map(|r| r.id.index)
            .max()
            .unwrap_or(0)
            + 1;
        let id = ButtonId::new(category, next);
        self.store.insert(&ButtonRecord::new(id, name))?;
        Ok(id)
    }

    pub fn rename_button(&mut self, id: ButtonId, name: &str) -> Result<()> {
        self.store.rename(id, name)
    }

    /// Remove a button. Its accelerator (if armed) is dropped and the rest
    /// of the category is renumbered; the armed set is rebuilt afterwards
    /// because sibling button identities shifted.
    pub fn delete_button(&mut self, id: ButtonId) -> Result<()> {
        let record = self.store.get(id)?.ok_or(SoundpadError::UnknownButton {
            category: id.category,
            index: id.index,
        })?;
        if let Some(key) = &record.shortcut_key {
            self.registry.unregister(key);
        }
        self.store.delete(id)?;
        self.reconcile()
    }

    pub fn copy_button(&mut self, id: ButtonId) -> Result<()> {
        let record = self.store.get(id)?.ok_or(SoundpadError::UnknownButton {
            category: id.category,
            index: id.index,
        })?;
        self.clipboard.contents = Some(ClipboardEntry {
            name: record.name,
            sound_path: record.sound_path,
        });
        Ok(())
    }

    /// Paste the copied assignment onto `target`. The shortcut of the target
    /// is kept; only name and sound move.
    pub fn paste_button(&mut self, target: ButtonId) -> Result<()> {
        let entry = self
            .clipboard
            .contents
            .clone()
            .ok_or_else(|| SoundpadError::Config("clipboard is empty".into()))?;
        self.store
            .assign(target, &entry.name, entry.sound_path.as_deref())
    }

    /// Import an audio file: obfuscate it into the sounds directory and
    /// point the button at the stored copy.
    pub fn import_sound(&mut self, id: ButtonId, source: &std::path::Path) -> Result<PathBuf> {
        let sounds_dir = self.config.sounds_dir();
        std::fs::create_dir_all(&sounds_dir)?;
        let stem = source
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("clip");
        let target = sounds_dir.join(format!("{}.bin", stem));
        codec::encode_file(source, &target)?;
        self.store.set_sound(id, Some(&target.to_string_lossy()))?;
        Ok(target)
    }

    /// Make sure the reserved toggle button exists so the enable gate is
    /// always reachable from the keyboard once the user binds a key to it.
    pub fn ensure_toggle_button(&mut self) -> Result<ButtonId> {
        if let Some(existing) = self
            .store
            .all()?
            .into_iter()
            .find(|r| r.action == ActionKind::ToggleHotkeys)
        {
            return Ok(existing.id);
        }
        let id = ButtonId::new(0, 1);
        self.store.insert(
            &ButtonRecord::new(id, "toggle").with_action(ActionKind::ToggleHotkeys),
        )?;
        info!(button = %id, "created reserved toggle button");
        Ok(id)
    }
}
