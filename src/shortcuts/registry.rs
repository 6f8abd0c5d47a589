//! Deterministic action registry with Vec storage.
//!
//! Uses Vec for deterministic iteration order and HashMap for O(1) lookup.
//! The registry is the single source of truth for bindings: every mutation
//! rebuilds the compiled `Keymap` from scratch and publishes it through the
//! registry's `SharedKeymap`.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use super::conflicts::Conflict;
use super::keymap::{Binding, BindingSource, Keymap, KeymapOptions, SharedKeymap};
use super::pattern::{Pattern, PatternParseError};
use super::persistence::{ImportError, OverrideDocument};

/// Errors from registering actions or loading a keymap file.
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("invalid pattern '{pattern}' for action '{action_id}': {error}")]
    InvalidPattern {
        action_id: String,
        pattern: String,
        #[source]
        error: PatternParseError,
    },
    #[error("action id must not be empty")]
    EmptyActionId,
    #[error("keymap file is not valid: {0}")]
    Json(#[from] serde_json::Error),
    #[error("could not read keymap file: {0}")]
    Io(#[from] std::io::Error),
}

/// An action and its default bindings.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ActionDefinition {
    pub id: String,
    pub label: String,
    pub description: Option<String>,
    pub keywords: Vec<String>,
    pub group: Option<String>,
    /// Default pattern strings.
    pub patterns: Vec<String>,
}

impl ActionDefinition {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            ..Default::default()
        }
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.patterns.push(pattern.into());
        self
    }

    pub fn with_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.patterns.extend(patterns.into_iter().map(Into::into));
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords.extend(keywords.into_iter().map(Into::into));
        self
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }
}

#[derive(Clone, Debug)]
struct RegisteredAction {
    definition: ActionDefinition,
    patterns: Vec<Pattern>,
}

/// Counts from a successful override import.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub overrides: usize,
    pub removed_defaults: usize,
}

/// Central registry of actions and their bindings.
#[derive(Debug)]
pub struct ShortcutRegistry {
    actions: Vec<RegisteredAction>,
    id_to_index: HashMap<String, usize>,
    /// pattern id -> (pattern, action id)
    overrides: BTreeMap<String, (Pattern, String)>,
    removed_defaults: BTreeSet<String>,
    options: KeymapOptions,
    shared: SharedKeymap,
}

impl Default for ShortcutRegistry {
    fn default() -> Self {
        Self::new(KeymapOptions::default())
    }
}

impl ShortcutRegistry {
    pub fn new(options: KeymapOptions) -> Self {
        Self {
            actions: Vec::new(),
            id_to_index: HashMap::new(),
            overrides: BTreeMap::new(),
            removed_defaults: BTreeSet::new(),
            options,
            shared: SharedKeymap::new(Keymap::build(Vec::new(), options)),
        }
    }

    /// Register (or replace) an action.
    ///
    /// Every pattern is parsed first; on error the registry is unchanged.
    pub fn register(&mut self, definition: ActionDefinition) -> Result<(), RegistryError> {
        if definition.id.is_empty() {
            return Err(RegistryError::EmptyActionId);
        }
        let patterns = definition
            .patterns
            .iter()
            .map(|source| {
                Pattern::parse(source).map_err(|error| RegistryError::InvalidPattern {
                    action_id: definition.id.clone(),
                    pattern: source.clone(),
                    error,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let id = definition.id.clone();
        let action = RegisteredAction {
            definition,
            patterns,
        };
        if let Some(&existing_index) = self.id_to_index.get(&id) {
            self.actions[existing_index] = action;
        } else {
            let index = self.actions.len();
            self.actions.push(action);
            self.id_to_index.insert(id, index);
        }
        self.rebuild();
        Ok(())
    }

    /// Remove an action. Returns false if it was not registered.
    pub fn unregister(&mut self, id: &str) -> bool {
        let Some(index) = self.id_to_index.remove(id) else {
            return false;
        };
        self.actions.remove(index);
        for slot in self.id_to_index.values_mut() {
            if *slot > index {
                *slot -= 1;
            }
        }
        self.rebuild();
        true
    }

    pub fn get(&self, id: &str) -> Option<&ActionDefinition> {
        self.id_to_index
            .get(id)
            .and_then(|&i| self.actions.get(i))
            .map(|a| &a.definition)
    }

    pub fn actions(&self) -> impl Iterator<Item = &ActionDefinition> {
        self.actions.iter().map(|a| &a.definition)
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Bind `pattern` to `action_id`, replacing any default on that pattern.
    pub fn set_override(&mut self, pattern: &str, action_id: &str) -> Result<(), RegistryError> {
        let parsed = Pattern::parse(pattern).map_err(|error| RegistryError::InvalidPattern {
            action_id: action_id.to_string(),
            pattern: pattern.to_string(),
            error,
        })?;
        self.overrides
            .insert(parsed.id(), (parsed, action_id.to_string()));
        self.rebuild();
        Ok(())
    }

    /// Drop the override on `pattern_id`. Returns false if there was none.
    pub fn clear_override(&mut self, pattern_id: &str) -> bool {
        let removed = self.overrides.remove(&canonical_id(pattern_id)).is_some();
        if removed {
            self.rebuild();
        }
        removed
    }

    /// Suppress every default binding on `pattern_id`; the actions stay registered.
    pub fn remove_default(&mut self, pattern_id: &str) {
        self.removed_defaults.insert(canonical_id(pattern_id));
        self.rebuild();
    }

    pub fn restore_default(&mut self, pattern_id: &str) -> bool {
        let restored = self.removed_defaults.remove(&canonical_id(pattern_id));
        if restored {
            self.rebuild();
        }
        restored
    }

    pub fn overrides(&self) -> impl Iterator<Item = (&str, &str)> {
        self.overrides
            .iter()
            .map(|(id, (_, action))| (id.as_str(), action.as_str()))
    }

    pub fn removed_defaults(&self) -> &BTreeSet<String> {
        &self.removed_defaults
    }

    /// The bindings that are live right now, in registration order.
    pub fn effective_bindings(&self) -> Vec<Binding> {
        let mut bindings = Vec::new();
        for action in &self.actions {
            for pattern in &action.patterns {
                let id = pattern.id();
                if self.removed_defaults.contains(&id) || self.overrides.contains_key(&id) {
                    continue;
                }
                bindings.push(Binding::new(
                    pattern.clone(),
                    action.definition.id.clone(),
                    BindingSource::Default,
                ));
            }
        }
        for (pattern, action_id) in self.overrides.values() {
            if !self.id_to_index.contains_key(action_id) {
                warn!(
                    pattern = %pattern,
                    action = %action_id,
                    "Override targets an unregistered action, skipping"
                );
                continue;
            }
            bindings.push(Binding::new(
                pattern.clone(),
                action_id.clone(),
                BindingSource::Override,
            ));
        }
        bindings
    }

    /// Current keymap snapshot.
    pub fn keymap(&self) -> Arc<Keymap> {
        self.shared.load()
    }

    /// Handle for state machines and other readers.
    pub fn shared_keymap(&self) -> SharedKeymap {
        self.shared.clone()
    }

    pub fn conflicts(&self) -> Vec<Conflict> {
        self.keymap().conflicts().to_vec()
    }

    /// Canonical pattern ids bound to `action_id`.
    pub fn patterns_for(&self, action_id: &str) -> Vec<String> {
        self.keymap()
            .patterns_for(action_id)
            .into_iter()
            .map(|e| e.id.clone())
            .collect()
    }

    /// Merge a persisted override document. All-or-nothing.
    pub fn apply_overrides(
        &mut self,
        document: &OverrideDocument,
    ) -> Result<ImportSummary, ImportError> {
        let parsed = document.parsed()?;
        let summary = ImportSummary {
            overrides: parsed.overrides.len(),
            removed_defaults: parsed.removed_defaults.len(),
        };
        for (pattern, action_id) in parsed.overrides {
            self.overrides.insert(pattern.id(), (pattern, action_id));
        }
        for pattern in parsed.removed_defaults {
            self.removed_defaults.insert(pattern.id());
        }
        self.rebuild();
        info!(
            overrides = summary.overrides,
            removed_defaults = summary.removed_defaults,
            "Imported shortcut overrides"
        );
        Ok(summary)
    }

    /// Parse, validate and merge an override document from JSON.
    pub fn import_overrides(&mut self, json: &str) -> Result<ImportSummary, ImportError> {
        let document = OverrideDocument::from_json(json)?;
        self.apply_overrides(&document)
    }

    /// Current overrides in the persisted format.
    pub fn export_overrides(&self) -> OverrideDocument {
        let mut document = OverrideDocument::new();
        for (id, (_, action_id)) in &self.overrides {
            document.overrides.insert(id.clone(), action_id.clone());
        }
        document.removed_defaults = self.removed_defaults.iter().cloned().collect();
        document
    }

    /// Registry populated from a keymap JSON document.
    pub fn from_keymap_json(json: &str, options: KeymapOptions) -> Result<Self, RegistryError> {
        let file: BTreeMap<String, ActionSpec> = serde_json::from_str(json)?;
        let mut registry = Self::new(options);
        for (id, spec) in file {
            registry.register(spec.into_definition(id))?;
        }
        Ok(registry)
    }

    pub fn from_keymap_file(path: &Path, options: KeymapOptions) -> Result<Self, RegistryError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_keymap_json(&json, options)
    }

    fn rebuild(&mut self) {
        let keymap = Keymap::build(self.effective_bindings(), self.options);
        info!(
            actions = self.actions.len(),
            patterns = keymap.len(),
            conflicts = keymap.conflicts().len(),
            "Rebuilt keymap"
        );
        self.shared.store(keymap);
    }
}

fn canonical_id(pattern_id: &str) -> String {
    Pattern::parse(pattern_id)
        .map(|p| p.id())
        .unwrap_or_else(|_| pattern_id.to_string())
}

/// One action in a keymap file: a pattern, a list, or a full record.
#[derive(Deserialize)]
#[serde(untagged)]
enum ActionSpec {
    One(String),
    Many(Vec<String>),
    Full(ActionRecord),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ActionRecord {
    #[serde(default)]
    patterns: Vec<String>,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    keywords: Vec<String>,
    #[serde(default)]
    group: Option<String>,
}

impl ActionSpec {
    fn into_definition(self, id: String) -> ActionDefinition {
        match self {
            Self::One(pattern) => ActionDefinition::new(id.clone(), id).with_pattern(pattern),
            Self::Many(patterns) => ActionDefinition::new(id.clone(), id).with_patterns(patterns),
            Self::Full(record) => ActionDefinition {
                label: record.label.unwrap_or_else(|| id.clone()),
                id,
                description: record.description,
                keywords: record.keywords,
                group: record.group,
                patterns: record.patterns,
            },
        }
    }
}
