//! Dual-output logging: structured JSONL to file, pretty output to stderr.
//!
//! The JSONL file (`~/.soundpad/logs/soundpad.jsonl`) is append-only and
//! written through a non-blocking worker so hotkey dispatch never stalls on
//! disk. Filter with `RUST_LOG`; default level is `info`.

use std::fs::{self, OpenOptions};
use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Keep this alive for the duration of the program; dropping it flushes and
/// closes the log file.
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
}

pub fn init() -> LoggingGuard {
    let log_dir = get_log_dir();
    if let Err(e) = fs::create_dir_all(&log_dir) {
        eprintln!("[LOGGING] Failed to create log directory: {}", e);
    }
    let log_path = log_dir.join("soundpad.jsonl");

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .unwrap_or_else(|e| {
            eprintln!("[LOGGING] Failed to open log file: {}", e);
            OpenOptions::new()
                .write(true)
                .open("/dev/null")
                .expect("Failed to open /dev/null")
        });

    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let json_layer = fmt::layer()
        .json()
        .with_writer(non_blocking_file)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_target(true)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(false)
        .with_line_number(false)
        .with_span_events(FmtSpan::NONE);

    let pretty_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_target(true)
        .with_level(true)
        .with_thread_ids(false)
        .compact();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(pretty_layer)
        .init();

    tracing::info!(log_path = %log_path.display(), "logging initialized");

    LoggingGuard {
        _file_guard: file_guard,
    }
}

/// Log directory (~/.soundpad/logs/).
fn get_log_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".soundpad").join("logs"))
        .unwrap_or_else(|| std::env::temp_dir().join("soundpad-logs"))
}
