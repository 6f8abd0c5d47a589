//! Structured JSONL logging plus human-readable stderr output.
//!
//! This module provides dual-output logging:
//! - **JSONL to file** (~/.shortcut-kit/logs/shortcut-kit.jsonl) - structured for tooling
//! - **Compact to stderr** - human-readable for developers
//!
//! # Usage
//!
//! ```rust,ignore
//! use shortcut_kit::logging;
//!
//! // Keep the guard alive for the duration of the program
//! let _guard = logging::init(logging::LoggingOptions::default());
//!
//! tracing::info!(event_type = "app_start", "Application started");
//! ```
//!
//! # JSONL Output Format
//!
//! ```json
//! {"timestamp":"2026-01-01T10:30:45.123Z","level":"DEBUG","target":"shortcut_kit::shortcuts::sequence","fields":{"message":"Sequence committed","action":"due:1d"}}
//! ```

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use time::macros::format_description;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

use crate::shortcuts::KeyCombination;

const DEFAULT_FILTER: &str = "info";

/// Guard that must be kept alive for the duration of the program.
/// Dropping this guard will flush and close the log file.
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
}

#[derive(Clone, Debug)]
pub struct LoggingOptions {
    /// JSONL file output; `None` logs to stderr only.
    pub json_path: Option<PathBuf>,
    /// Filter used when `RUST_LOG` is unset.
    pub default_filter: String,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            json_path: Some(log_path()),
            default_filter: DEFAULT_FILTER.to_string(),
        }
    }
}

/// Initialize the logging system.
///
/// Returns a guard that MUST be kept alive for the duration of the program.
pub fn init(options: LoggingOptions) -> LoggingGuard {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&options.default_filter));

    let (json_layer, file_guard) = match options.json_path.as_ref().and_then(|p| open_log_file(p)) {
        Some(file) => {
            let (writer, guard) = tracing_appender::non_blocking(file);
            let layer = fmt::layer()
                .json()
                .with_writer(writer)
                .with_timer(fmt::time::UtcTime::rfc_3339())
                .with_target(true)
                .with_level(true)
                .with_thread_ids(false)
                .with_thread_names(false)
                .with_file(false)
                .with_line_number(false)
                .with_span_events(FmtSpan::NONE);
            (Some(layer.boxed()), Some(guard))
        }
        None => (None, None),
    };

    let pretty_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_target(true)
        .with_level(true)
        .with_thread_ids(false)
        .with_timer(fmt::time::UtcTime::new(format_description!(
            "[hour]:[minute]:[second].[subsecond digits:3]"
        )))
        .compact();

    if let Err(e) = tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(pretty_layer)
        .try_init()
    {
        eprintln!("[LOGGING] Subscriber already installed: {}", e);
    }

    tracing::info!(
        event_type = "app_lifecycle",
        action = "started",
        log_path = ?options.json_path,
        "Logging initialized"
    );

    LoggingGuard {
        _file_guard: file_guard,
    }
}

fn open_log_file(path: &Path) -> Option<fs::File> {
    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            eprintln!("[LOGGING] Failed to create log directory: {}", e);
            return None;
        }
    }
    match OpenOptions::new().create(true).append(true).open(path) {
        Ok(file) => Some(file),
        Err(e) => {
            eprintln!("[LOGGING] Failed to open log file: {}", e);
            None
        }
    }
}

/// Get the log directory path (~/.shortcut-kit/logs/)
fn get_log_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".shortcut-kit").join("logs"))
        .unwrap_or_else(|| std::env::temp_dir().join("shortcut-kit-logs"))
}

/// Get the path to the JSONL log file
pub fn log_path() -> PathBuf {
    get_log_dir().join("shortcut-kit.jsonl")
}

// =============================================================================
// STRUCTURED LOGGING HELPERS
// =============================================================================

/// Log a key event fed to a sequence state machine
pub fn log_key_event(combo: &KeyCombination, outcome: &str) {
    tracing::debug!(
        event_type = "key_event",
        key = %combo.key,
        modifiers = ?combo.modifiers,
        outcome = outcome,
        "Key {} {}", combo.to_canonical_string(), outcome
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_path_names_jsonl_file() {
        let path = log_path();
        assert!(path.ends_with("shortcut-kit.jsonl"));
    }

    #[test]
    fn open_log_file_creates_parent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("log.jsonl");
        assert!(open_log_file(&path).is_some());
        assert!(path.exists());
    }
}
