//! Interactive shortcut capture.
//!
//! A session suspends the OS accelerators so the key the user presses is not
//! swallowed by an existing binding, classifies each raw key press, checks it
//! against the store, and commits or restores on the way out. Closing the
//! dialog without saving must go through `cancel` so no accelerator stays
//! suspended.

use tracing::{debug, info};

use crate::error::{Result, SoundpadError};
use crate::keycode::{self, KeyInfo};
use crate::registry::{AcceleratorBackend, AcceleratorRegistry};
use crate::store::{BindingStore, ButtonId};

/// Observable session state, mirrored by the capture dialog.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CaptureState {
    /// Listening; `staged` key (if any) is saveable.
    Capturing,
    /// Last key pressed is held by another button; save is disabled until a
    /// different, non-conflicting key arrives.
    ConflictShown { holder: String },
}

pub struct CaptureSession {
    target: ButtonId,
    staged: Option<KeyInfo>,
    state: CaptureState,
}

impl CaptureSession {
    /// Begin capturing for `target`. Suspends the registry so the OS stops
    /// intercepting candidate keys.
    pub fn start<B: AcceleratorBackend>(
        target: ButtonId,
        registry: &mut AcceleratorRegistry<B>,
    ) -> Self {
        registry.suspend();
        info!(button = %target, "shortcut capture started");
        Self {
            target,
            staged: None,
            state: CaptureState::Capturing,
        }
    }

    pub fn target(&self) -> ButtonId {
        self.target
    }

    pub fn state(&self) -> &CaptureState {
        &self.state
    }

    /// Key staged for commit, if the last press was non-conflicting.
    pub fn staged(&self) -> Option<&KeyInfo> {
        self.staged.as_ref()
    }

    pub fn can_commit(&self) -> bool {
        self.staged.is_some() && self.state == CaptureState::Capturing
    }

    /// Feed one raw key press into the session. Unrecognized codes leave the
    /// session exactly as it was.
    pub fn key_pressed(&mut self, raw: u32, store: &BindingStore) -> Result<&CaptureState> {
        let Some(info) = keycode::translate(raw) else {
            debug!(raw, "unrecognized key, still capturing");
            return Ok(&self.state);
        };

        match store.find_conflict(&info.canonical, self.target)? {
            Some(holder) => {
                debug!(key = %info.canonical, holder = %holder.name, "conflicting key pressed");
                self.staged = None;
                self.state = CaptureState::ConflictShown { holder: holder.name };
            }
            None => {
                debug!(key = %info.canonical, display = %info.display, "key staged");
                self.staged = Some(info);
                self.state = CaptureState::Capturing;
            }
        }
        Ok(&self.state)
    }

    /// Persist the staged key, then rebuild the armed set against the updated
    /// store. On persistence failure the session stays open and the armed set
    /// is left as-is (still suspended) rather than reconciled against an
    /// unsaved store.
    pub fn commit<B: AcceleratorBackend>(
        &mut self,
        store: &BindingStore,
        registry: &mut AcceleratorRegistry<B>,
        enabled: bool,
    ) -> Result<KeyInfo> {
        let staged = match (&self.state, self.staged.clone()) {
            (CaptureState::Capturing, Some(staged)) => staged,
            _ => return Err(SoundpadError::NothingStaged),
        };

        store.bind(self.target, &staged.canonical, &staged.display)?;
        registry.reconcile(&store.all()?, enabled);
        info!(button = %self.target, key = %staged.canonical, "shortcut capture committed");
        Ok(staged)
    }

    /// Discard the staged key and restore the exact pre-session armed set.
    /// Also what an implicit dialog-close runs.
    pub fn cancel<B: AcceleratorBackend>(self, registry: &mut AcceleratorRegistry<B>) {
        registry.resume();
        info!(button = %self.target, "shortcut capture cancelled");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::testing::FakeBackend;
    use crate::store::ButtonRecord;

    fn setup() -> (BindingStore, AcceleratorRegistry<FakeBackend>) {
        let store = BindingStore::open_in_memory().unwrap();
        for i in 1..=3 {
            store
                .insert(&ButtonRecord::new(
                    ButtonId::new(1, i),
                    format!("button-{}", i),
                ))
                .unwrap();
        }
        let registry = AcceleratorRegistry::new(FakeBackend::new());
        (store, registry)
    }

    #[test]
    fn pressing_a_conflicting_key_shows_the_holder() {
        let (store, mut registry) = setup();
        store.bind(ButtonId::new(1, 1), "65", "A").unwrap();
        registry.reconcile(&store.all().unwrap(), true);

        let mut session = CaptureSession::start(ButtonId::new(1, 2), &mut registry);
        let state = session.key_pressed(65, &store).unwrap();
        assert_eq!(
            state,
            &CaptureState::ConflictShown {
                holder: "button-1".into()
            }
        );
        assert!(!session.can_commit());
        assert!(matches!(
            session.commit(&store, &mut registry, true),
            Err(SoundpadError::NothingStaged)
        ));
    }

    #[test]
    fn clean_key_after_conflict_returns_to_capturing() {
        let (store, mut registry) = setup();
        store.bind(ButtonId::new(1, 1), "65", "A").unwrap();

        let mut session = CaptureSession::start(ButtonId::new(1, 2), &mut registry);
        session.key_pressed(65, &store).unwrap();
        let state = session.key_pressed(66, &store).unwrap();
        assert_eq!(state, &CaptureState::Capturing);
        assert_eq!(session.staged().unwrap().display, "B");
        assert!(session.can_commit());
    }

    #[test]
    fn own_key_is_not_a_conflict() {
        let (store, mut registry) = setup();
        store.bind(ButtonId::new(1, 2), "65", "A").unwrap();

        let mut session = CaptureSession::start(ButtonId::new(1, 2), &mut registry);
        session.key_pressed(65, &store).unwrap();
        assert!(session.can_commit());
    }

    #[test]
    fn unrecognized_keys_leave_the_session_untouched() {
        let (store, mut registry) = setup();
        let mut session = CaptureSession::start(ButtonId::new(1, 1), &mut registry);
        // 17 is a bare Ctrl press.
        let state = session.key_pressed(17, &store).unwrap();
        assert_eq!(state, &CaptureState::Capturing);
        assert!(session.staged().is_none());
    }

    #[test]
    fn commit_persists_and_rearms() {
        let (store, mut registry) = setup();
        store.bind(ButtonId::new(1, 1), "65", "A").unwrap();
        registry.reconcile(&store.all().unwrap(), true);

        let mut session = CaptureSession::start(ButtonId::new(1, 2), &mut registry);
        assert!(registry.is_suspended());
        session.key_pressed(70, &store).unwrap();
        let committed = session.commit(&store, &mut registry, true).unwrap();
        assert_eq!(committed.display, "F");

        let rec = store.get(ButtonId::new(1, 2)).unwrap().unwrap();
        assert_eq!(rec.shortcut_key.as_deref(), Some("70"));
        assert!(!registry.is_suspended());
        assert_eq!(
            registry.armed_keys(),
            vec!["65".to_string(), "70".to_string()]
        );
    }

    #[test]
    fn cancel_without_keypress_restores_everything() {
        let (store, mut registry) = setup();
        store.bind(ButtonId::new(1, 1), "65", "A").unwrap();
        registry.reconcile(&store.all().unwrap(), true);
        let before_store = store.all().unwrap();
        let before_armed = registry.armed_keys();

        let session = CaptureSession::start(ButtonId::new(1, 2), &mut registry);
        session.cancel(&mut registry);

        assert_eq!(store.all().unwrap(), before_store);
        assert_eq!(registry.armed_keys(), before_armed);
        assert!(!registry.is_suspended());
    }

    #[test]
    fn cancel_after_staging_discards_the_key() {
        let (store, mut registry) = setup();
        registry.reconcile(&store.all().unwrap(), true);

        let mut session = CaptureSession::start(ButtonId::new(1, 1), &mut registry);
        session.key_pressed(70, &store).unwrap();
        session.cancel(&mut registry);

        let rec = store.get(ButtonId::new(1, 1)).unwrap().unwrap();
        assert_eq!(rec.shortcut_key, None);
    }
}
