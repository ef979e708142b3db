//! Soundboard hotkey binding and reconciliation engine.
//!
//! A grid of buttons, each mapped to an audio clip, triggerable by a global
//! keyboard shortcut. This crate owns the binding store, the OS accelerator
//! reconciliation, the interactive capture flow, the enable toggle and the
//! obfuscation codec for stored clips; rendering and audio playback are
//! external collaborators behind narrow traits.

pub mod actions;
pub mod capture;
pub mod codec;
pub mod config;
pub mod engine;
pub mod error;
pub mod keycode;
pub mod logging;
pub mod registry;
pub mod store;

pub use actions::{ActionExecutor, ActionKind};
pub use capture::{CaptureSession, CaptureState};
pub use config::Config;
pub use engine::{ButtonClipboard, Engine};
pub use error::{Result, ResultExt, SoundpadError};
pub use keycode::KeyInfo;
pub use registry::{AcceleratorBackend, AcceleratorRegistry};
pub use store::{BindingStore, ButtonId, ButtonRecord};
