use thiserror::Error;
use tracing::{error, warn};

/// Domain errors. None of these terminate the process; they are surfaced
/// per-operation and the caller decides what to show the user.
#[derive(Error, Debug)]
pub enum SoundpadError {
    #[error("shortcut '{display}' is already bound to button '{holder}'")]
    Conflict { display: String, holder: String },

    #[error("key code {0} is not bindable")]
    UnrecognizedKey(u32),

    #[error("no button at category {category}, index {index}")]
    UnknownButton { category: i64, index: i64 },

    #[error("persistence failed: {0}")]
    Persistence(#[from] rusqlite::Error),

    #[error("another shortcut capture is already in progress")]
    CaptureBusy,

    #[error("no shortcut capture is active")]
    CaptureIdle,

    #[error("no key staged; press a non-conflicting key first")]
    NothingStaged,

    #[error("not an obfuscated audio file (bad marker)")]
    BadMagic,

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SoundpadError>;

/// Extension trait for silent error logging with caller location tracking.
/// Use when the operation is recoverable and the flow should continue.
pub trait ResultExt<T> {
    /// Log the error with caller location and return `None`.
    fn log_err(self) -> Option<T>;
    /// Log as a warning with caller location and return `None`.
    fn warn_on_err(self) -> Option<T>;
}

impl<T, E: std::fmt::Debug> ResultExt<T> for std::result::Result<T, E> {
    #[track_caller]
    fn log_err(self) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(err) => {
                let caller = std::panic::Location::caller();
                error!(
                    error = ?err,
                    file = caller.file(),
                    line = caller.line(),
                    "Operation failed"
                );
                None
            }
        }
    }

    #[track_caller]
    fn warn_on_err(self) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(err) => {
                let caller = std::panic::Location::caller();
                warn!(
                    error = ?err,
                    file = caller.file(),
                    line = caller.line(),
                    "Operation had warning"
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_message_names_the_holder() {
        let err = SoundpadError::Conflict {
            display: "A".into(),
            holder: "airhorn".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("airhorn"));
        assert!(msg.contains("'A'"));
    }

    #[test]
    fn log_err_returns_value_on_ok() {
        let ok: std::result::Result<i32, String> = Ok(3);
        assert_eq!(ok.log_err(), Some(3));
        let bad: std::result::Result<i32, String> = Err("nope".into());
        assert_eq!(bad.log_err(), None);
    }
}
