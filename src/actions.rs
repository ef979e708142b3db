//! Button action kinds and the playback-side executor seam.
//!
//! Audio playback itself lives outside this crate; the registry only needs
//! something to hand `(action, sound, name)` to when an accelerator fires.

use tracing::info;

/// What a button does when triggered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ActionKind {
    #[default]
    PlaySound,
    Stop,
    Pause,
    ToggleHotkeys,
}

impl ActionKind {
    /// Stable string form used in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PlaySound => "play_sound",
            Self::Stop => "stop",
            Self::Pause => "pause",
            Self::ToggleHotkeys => "toggle_hotkey",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "play_sound" => Some(Self::PlaySound),
            "stop" => Some(Self::Stop),
            "pause" => Some(Self::Pause),
            "toggle_hotkey" => Some(Self::ToggleHotkeys),
            _ => None,
        }
    }
}

/// External collaborator that performs the actual audio work.
///
/// `execute_pause` toggles pause/resume; that state lives in the executor,
/// not here.
pub trait ActionExecutor {
    fn execute_play(&mut self, sound_ref: &str, display_name: &str);
    fn execute_stop(&mut self);
    fn execute_pause(&mut self);
    fn execute_toggle_hotkeys(&mut self);
}

/// Executor for the headless binary: logs what would be played.
#[derive(Default)]
pub struct LogExecutor;

impl ActionExecutor for LogExecutor {
    fn execute_play(&mut self, sound_ref: &str, display_name: &str) {
        info!(sound = sound_ref, button = display_name, "play");
    }

    fn execute_stop(&mut self) {
        info!("stop playback");
    }

    fn execute_pause(&mut self) {
        info!("toggle pause");
    }

    fn execute_toggle_hotkeys(&mut self) {
        info!("toggle hotkeys");
    }
}
