use thiserror::Error;
use tracing::{error, warn};

use crate::config::ConfigError;
use crate::shortcuts::{ImportError, PatternParseError, PersistenceError, RegistryError};

/// Error severity for UI display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,    // informational
    Warning, // recoverable
    Error,   // operation failed
}

/// Domain-specific errors for shortcut-kit
#[derive(Error, Debug)]
pub enum ShortcutKitError {
    #[error("Invalid shortcut pattern: {0}")]
    Pattern(#[from] PatternParseError),

    #[error("Registration failed: {0}")]
    Registry(#[from] RegistryError),

    #[error("Override import failed: {0}")]
    Import(#[from] ImportError),

    #[error("Override file error: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl ShortcutKitError {
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Pattern(_) => ErrorSeverity::Error,
            Self::Registry(_) => ErrorSeverity::Error,
            Self::Import(_) => ErrorSeverity::Warning,
            Self::Persistence(PersistenceError::Io(_)) => ErrorSeverity::Error,
            Self::Persistence(_) => ErrorSeverity::Warning,
            Self::Config(_) => ErrorSeverity::Info,
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            Self::Pattern(e) => format!("That shortcut is not valid: {}", e),
            Self::Registry(RegistryError::InvalidPattern {
                action_id, pattern, ..
            }) => format!("Shortcut '{}' for '{}' is not valid", pattern, action_id),
            Self::Registry(e) => e.to_string(),
            Self::Import(ImportError::MissingField(field)) => {
                format!("The imported file has no '{}' section", field)
            }
            Self::Import(ImportError::InvalidPattern { pattern, .. }) => {
                format!("The imported file contains an invalid shortcut: {}", pattern)
            }
            Self::Import(_) => "The imported file is not a shortcut export".to_string(),
            Self::Persistence(e) => format!("Could not access saved shortcuts: {}", e),
            Self::Config(_) => "Configuration could not be read, using defaults".to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ShortcutKitError>;

/// Extension trait for silent error logging with caller location tracking.
/// Use when the operation is recoverable and user doesn't need to know.
///
/// # Examples
///
/// ```ignore
/// use shortcut_kit::error::ResultExt;
///
/// // Keep the defaults if saved overrides can't be read
/// let saved = OverrideDocument::load(&path).warn_on_err();
/// ```
pub trait ResultExt<T> {
    /// Log error with caller location and return None. Use for recoverable failures.
    fn log_err(self) -> Option<T>;
    /// Log as warning with caller location and return None. Use for expected failures.
    fn warn_on_err(self) -> Option<T>;
}

impl<T, E: std::fmt::Debug> ResultExt<T> for std::result::Result<T, E> {
    #[track_caller]
    fn log_err(self) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(error) => {
                let caller = std::panic::Location::caller();
                error!(
                    error = ?error,
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
            Err(error) => {
                let caller = std::panic::Location::caller();
                warn!(
                    error = ?error,
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
    use crate::shortcuts::{OverrideDocument, Pattern};

    #[test]
    fn import_errors_are_warnings() {
        let err: ShortcutKitError = OverrideDocument::from_json(r#"{"version":"0.8.0"}"#)
            .unwrap_err()
            .into();
        assert_eq!(err.severity(), ErrorSeverity::Warning);
        assert!(err.user_message().contains("overrides"));
    }

    #[test]
    fn pattern_errors_convert() {
        let err: ShortcutKitError = Pattern::parse("").unwrap_err().into();
        assert_eq!(err.severity(), ErrorSeverity::Error);
        assert!(err.to_string().starts_with("Invalid shortcut pattern"));
    }

    #[test]
    fn result_ext_returns_value_or_none() {
        let ok: std::result::Result<u8, &str> = Ok(1);
        assert_eq!(ok.log_err(), Some(1));
        let err: std::result::Result<u8, &str> = Err("nope");
        assert_eq!(err.warn_on_err(), None);
    }
}
