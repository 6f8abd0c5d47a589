//! Duplicate and prefix conflict detection.

use std::collections::{BTreeMap, BTreeSet};

use super::keymap::Binding;
use super::pattern::Pattern;

/// Type of shortcut conflict.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ConflictKind {
    /// Two or more actions bound to the identical canonical pattern.
    Duplicate,
    /// The pattern is a strict prefix of another pattern bound elsewhere, so a
    /// terminal match on it is ambiguous until the sequence times out or Enter
    /// is pressed.
    Prefix,
}

/// A conflict between bindings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Conflict {
    pub pattern_id: String,
    pub action_ids: BTreeSet<String>,
    pub kind: ConflictKind,
    /// For `Prefix`, the longer pattern that extends `pattern_id`.
    pub extended_by: Option<String>,
}

impl Conflict {
    pub fn involves(&self, action_id: &str) -> bool {
        self.action_ids.contains(action_id)
    }
}

/// Scan bindings for duplicates and prefix relationships.
///
/// The result is sorted, so it does not depend on the order of `bindings`.
pub fn detect_conflicts(bindings: &[Binding]) -> Vec<Conflict> {
    let mut by_pattern: BTreeMap<String, (&Pattern, BTreeSet<String>)> = BTreeMap::new();
    for binding in bindings {
        by_pattern
            .entry(binding.pattern_id.clone())
            .or_insert_with(|| (&binding.pattern, BTreeSet::new()))
            .1
            .insert(binding.action_id.clone());
    }

    let mut conflicts = Vec::new();

    for (pattern_id, (_, actions)) in &by_pattern {
        if actions.len() > 1 {
            conflicts.push(Conflict {
                pattern_id: pattern_id.clone(),
                action_ids: actions.clone(),
                kind: ConflictKind::Duplicate,
                extended_by: None,
            });
        }
    }

    let entries: Vec<_> = by_pattern.iter().collect();
    for (short_id, (short, short_actions)) in &entries {
        for (long_id, (long, long_actions)) in &entries {
            if !short.is_strict_prefix_of(long) || short_actions == long_actions {
                continue;
            }
            conflicts.push(Conflict {
                pattern_id: (*short_id).clone(),
                action_ids: short_actions.union(long_actions).cloned().collect(),
                kind: ConflictKind::Prefix,
                extended_by: Some((*long_id).clone()),
            });
        }
    }

    conflicts.sort_by(|a, b| {
        (&a.pattern_id, a.kind, &a.extended_by).cmp(&(&b.pattern_id, b.kind, &b.extended_by))
    });
    conflicts
}

/// Conflicts that involve `action_id`.
pub fn conflicts_for<'a>(conflicts: &'a [Conflict], action_id: &str) -> Vec<&'a Conflict> {
    conflicts.iter().filter(|c| c.involves(action_id)).collect()
}
