//! Persisted application settings.
//!
//! JSON file at `~/.soundpad/config.json`. Missing file or unreadable
//! content falls back to defaults; unknown fields are ignored so older
//! builds can open newer configs.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Result, SoundpadError};

pub const DEFAULT_VOLUME: u8 = 100;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioSettings {
    /// Playback volume, 0-100.
    #[serde(default = "default_volume")]
    pub volume: u8,
    /// Output device id; `None` means the system default.
    #[serde(default)]
    pub device: Option<String>,
    #[serde(default)]
    pub repeat: bool,
}

fn default_volume() -> u8 {
    DEFAULT_VOLUME
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            volume: DEFAULT_VOLUME,
            device: None,
            repeat: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShortcutSettings {
    /// Process-wide enable gate, true at startup on a fresh install.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

impl Default for ShortcutSettings {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiSettings {
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_theme() -> String {
    "light".to_string()
}

fn default_language() -> String {
    "zh_CN".to_string()
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            theme: default_theme(),
            language: default_language(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub audio: AudioSettings,
    #[serde(default)]
    pub shortcuts: ShortcutSettings,
    #[serde(default)]
    pub ui: UiSettings,
    /// Directory holding the obfuscated audio clips.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sounds_dir: Option<String>,
}

impl Config {
    pub fn sounds_dir(&self) -> PathBuf {
        match &self.sounds_dir {
            Some(dir) => PathBuf::from(shellexpand::tilde(dir).as_ref()),
            None => PathBuf::from(shellexpand::tilde("~/.soundpad/sounds").as_ref()),
        }
    }

    /// Load from `path`, falling back to defaults when the file is absent or
    /// malformed. A malformed file is never fatal; it is logged and ignored.
    pub fn load(path: &Path) -> Config {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(_) => {
                info!(path = %path.display(), "config not found, using defaults");
                return Config::default();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "config unreadable, using defaults");
                Config::default()
            }
        }
    }

    /// Write the config back. This must succeed before any reconcile that
    /// depends on the persisted state.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(self)
            .map_err(|e| SoundpadError::Config(e.to_string()))?;
        fs::write(path, raw)?;
        Ok(())
    }
}

/// Default config location (~/.soundpad/config.json).
pub fn default_config_path() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".soundpad").join("config.json"))
        .unwrap_or_else(|| std::env::temp_dir().join("soundpad-config.json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = Config::default();
        assert_eq!(config.audio.volume, 100);
        assert!(config.shortcuts.enabled);
        assert_eq!(config.ui.language, "zh_CN");
        assert!(config.audio.device.is_none());
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("nope.json"));
        assert!(config.shortcuts.enabled);
    }

    #[test]
    fn malformed_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{volume: oops").unwrap();
        let config = Config::load(&path);
        assert_eq!(config.audio.volume, 100);
    }

    #[test]
    fn save_and_reload_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = Config::default();
        config.audio.volume = 40;
        config.audio.device = Some("usb-interface".into());
        config.shortcuts.enabled = false;
        config.save(&path).unwrap();

        let loaded = Config::load(&path);
        assert_eq!(loaded.audio.volume, 40);
        assert_eq!(loaded.audio.device.as_deref(), Some("usb-interface"));
        assert!(!loaded.shortcuts.enabled);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"audio":{"volume":55}}"#).unwrap();
        let config = Config::load(&path);
        assert_eq!(config.audio.volume, 55);
        assert!(config.shortcuts.enabled);
    }
}
