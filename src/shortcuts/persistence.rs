//! User override persistence.
//!
//! Handles importing and exporting user overrides as a JSON document:
//!
//! ```json
//! {
//!   "version": "0.8.0",
//!   "exportedAt": "2026-01-01T00:00:00Z",
//!   "overrides": { "ctrl+shift+k": "palette.open" },
//!   "removedDefaults": ["g t"]
//! }
//! ```
//!
//! `overrides` maps a pattern id to the action it now triggers;
//! `removedDefaults` lists pattern ids whose default bindings are suppressed.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::pattern::{Pattern, PatternParseError};

const OVERRIDES_FIELD: &str = "overrides";
const REMOVED_DEFAULTS_FIELD: &str = "removedDefaults";

/// Errors from validating an override document.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("override document is not valid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),
    #[error("override document must be a JSON object")]
    NotAnObject,
    #[error("override document is missing required field '{0}'")]
    MissingField(&'static str),
    #[error("override document is malformed: {0}")]
    Malformed(#[source] serde_json::Error),
    #[error("invalid pattern '{pattern}' in override document: {error}")]
    InvalidPattern {
        pattern: String,
        #[source]
        error: PatternParseError,
    },
    #[error("override for '{0}' has an empty action id")]
    EmptyAction(String),
}

/// Errors from reading or writing the overrides file.
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Import(#[from] ImportError),
    #[error("could not serialize overrides: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// Persisted user overrides.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverrideDocument {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exported_at: Option<DateTime<Utc>>,
    pub overrides: BTreeMap<String, String>,
    pub removed_defaults: Vec<String>,
}

fn default_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

impl Default for OverrideDocument {
    fn default() -> Self {
        Self {
            version: default_version(),
            exported_at: None,
            overrides: BTreeMap::new(),
            removed_defaults: Vec::new(),
        }
    }
}

/// An override document whose patterns have all been parsed.
#[derive(Clone, Debug)]
pub struct ParsedOverrides {
    pub overrides: Vec<(Pattern, String)>,
    pub removed_defaults: Vec<Pattern>,
}

impl OverrideDocument {
    /// Empty document stamped with the current time.
    pub fn new() -> Self {
        Self {
            exported_at: Some(Utc::now()),
            ..Default::default()
        }
    }

    /// Parse and validate a document. Nothing is returned unless every
    /// field and pattern is valid.
    pub fn from_json(json: &str) -> Result<Self, ImportError> {
        let value: serde_json::Value =
            serde_json::from_str(json).map_err(ImportError::InvalidJson)?;
        let object = value.as_object().ok_or(ImportError::NotAnObject)?;
        for field in [OVERRIDES_FIELD, REMOVED_DEFAULTS_FIELD] {
            if !object.contains_key(field) {
                return Err(ImportError::MissingField(field));
            }
        }
        let document: Self = serde_json::from_value(value).map_err(ImportError::Malformed)?;
        document.parsed()?;
        Ok(document)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Parse every pattern in the document.
    pub fn parsed(&self) -> Result<ParsedOverrides, ImportError> {
        let overrides = self
            .overrides
            .iter()
            .map(|(pattern, action)| {
                if action.trim().is_empty() {
                    return Err(ImportError::EmptyAction(pattern.clone()));
                }
                Ok((parse_pattern(pattern)?, action.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let removed_defaults = self
            .removed_defaults
            .iter()
            .map(|p| parse_pattern(p))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ParsedOverrides {
            overrides,
            removed_defaults,
        })
    }

    /// Load a document from disk.
    ///
    /// Returns an empty document if the file doesn't exist.
    pub fn load(path: &Path) -> Result<Self, PersistenceError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        Ok(Self::from_json(&content)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), PersistenceError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = self.to_json().map_err(PersistenceError::Serialize)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty() && self.removed_defaults.is_empty()
    }
}

fn parse_pattern(source: &str) -> Result<Pattern, ImportError> {
    Pattern::parse(source).map_err(|error| ImportError::InvalidPattern {
        pattern: source.to_string(),
        error,
    })
}

/// Default path for user overrides: ~/.shortcut-kit/overrides.json
pub fn default_overrides_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_default()
        .join(".shortcut-kit")
        .join("overrides.json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn load_nonexistent_returns_empty() {
        let doc = OverrideDocument::load(Path::new("/nonexistent/path/overrides.json")).unwrap();
        assert!(doc.is_empty());
    }

    #[test]
    fn save_and_load_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("overrides.json");

        let mut doc = OverrideDocument::new();
        doc.overrides
            .insert("ctrl+shift+k".to_string(), "palette.open".to_string());
        doc.removed_defaults.push("g t".to_string());
        doc.save(&path).unwrap();

        let loaded = OverrideDocument::load(&path).unwrap();
        assert_eq!(loaded, doc);
    }

    #[test]
    fn exported_json_uses_camel_case() {
        let mut doc = OverrideDocument::new();
        doc.removed_defaults.push("x".to_string());
        let json = doc.to_json().unwrap();
        assert!(json.contains("\"exportedAt\""));
        assert!(json.contains("\"removedDefaults\""));
        assert!(json.contains(&format!("\"version\": \"{}\"", env!("CARGO_PKG_VERSION"))));
    }

    #[test]
    fn missing_overrides_field_is_named() {
        let err = OverrideDocument::from_json(r#"{"version":"0.8.0"}"#).unwrap_err();
        assert!(matches!(err, ImportError::MissingField("overrides")));
        assert!(err.to_string().contains("overrides"));
    }

    #[test]
    fn missing_removed_defaults_field_is_named() {
        let err = OverrideDocument::from_json(r#"{"overrides":{}}"#).unwrap_err();
        assert!(err.to_string().contains("removedDefaults"));
    }

    #[test]
    fn rejects_non_objects_and_bad_json() {
        assert!(matches!(
            OverrideDocument::from_json("[]"),
            Err(ImportError::NotAnObject)
        ));
        assert!(matches!(
            OverrideDocument::from_json("{not json"),
            Err(ImportError::InvalidJson(_))
        ));
        assert!(matches!(
            OverrideDocument::from_json(r#"{"overrides":[],"removedDefaults":[]}"#),
            Err(ImportError::Malformed(_))
        ));
    }

    #[test]
    fn rejects_invalid_pattern() {
        let err = OverrideDocument::from_json(
            r#"{"overrides":{"hyper+k":"a"},"removedDefaults":[]}"#,
        )
        .unwrap_err();
        match err {
            ImportError::InvalidPattern { pattern, .. } => assert_eq!(pattern, "hyper+k"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn version_and_timestamp_are_optional() {
        let doc =
            OverrideDocument::from_json(r#"{"overrides":{"x":"close"},"removedDefaults":[]}"#)
                .unwrap();
        assert_eq!(doc.version, env!("CARGO_PKG_VERSION"));
        assert!(doc.exported_at.is_none());
        assert_eq!(doc.overrides.get("x").map(String::as_str), Some("close"));
    }

    #[test]
    fn load_reports_invalid_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("overrides.json");
        fs::write(&path, r#"{"version":"0.8.0"}"#).unwrap();
        assert!(matches!(
            OverrideDocument::load(&path),
            Err(PersistenceError::Import(ImportError::MissingField(_)))
        ));
    }
}
