//! Compiled keymap: the read-only snapshot every matcher works against.
//!
//! A `Keymap` is derived data. It is rebuilt from the registry's binding list
//! after every change and published wholesale through `SharedKeymap`.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use super::conflicts::{detect_conflicts, Conflict, ConflictKind};
use super::pattern::Pattern;
use super::types::Platform;

/// Where a binding came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BindingSource {
    /// Registered with the action.
    Default,
    /// User override (imported or set at runtime).
    Override,
}

/// One pattern bound to one action.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Binding {
    pub pattern: Pattern,
    pub pattern_id: String,
    pub action_id: String,
    pub source: BindingSource,
}

impl Binding {
    pub fn new(pattern: Pattern, action_id: impl Into<String>, source: BindingSource) -> Self {
        Self {
            pattern_id: pattern.id(),
            pattern,
            action_id: action_id.into(),
            source,
        }
    }
}

/// All actions bound to one canonical pattern.
#[derive(Clone, Debug)]
pub struct KeymapEntry {
    pub pattern: Pattern,
    pub id: String,
    pub display: String,
    /// Bound actions in registration order; more than one is a duplicate conflict.
    pub actions: Vec<String>,
    /// Excluded from live matching (duplicate with disable-on-conflict).
    pub disabled: bool,
    /// Position in registration order, used to break ties.
    pub order: usize,
}

impl KeymapEntry {
    /// The action a commit on this entry dispatches.
    pub fn action(&self) -> Option<&str> {
        if self.disabled {
            return None;
        }
        self.actions.first().map(String::as_str)
    }
}

/// Options applied while compiling a keymap.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeymapOptions {
    pub disable_on_conflict: bool,
    pub platform: Platform,
}

impl Default for KeymapOptions {
    fn default() -> Self {
        Self {
            disable_on_conflict: false,
            platform: Platform::current(),
        }
    }
}

/// Compiled pattern set with conflicts.
#[derive(Clone, Debug)]
pub struct Keymap {
    entries: Vec<KeymapEntry>,
    index: HashMap<String, usize>,
    conflicts: Vec<Conflict>,
    platform: Platform,
}

impl Default for Keymap {
    fn default() -> Self {
        Self::build(Vec::new(), KeymapOptions::default())
    }
}

impl Keymap {
    pub fn build(bindings: Vec<Binding>, options: KeymapOptions) -> Self {
        let conflicts = detect_conflicts(&bindings);

        let mut entries: Vec<KeymapEntry> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        for binding in bindings {
            if let Some(&i) = index.get(&binding.pattern_id) {
                let entry = &mut entries[i];
                if !entry.actions.contains(&binding.action_id) {
                    entry.actions.push(binding.action_id);
                }
                continue;
            }
            let order = entries.len();
            index.insert(binding.pattern_id.clone(), order);
            entries.push(KeymapEntry {
                display: binding.pattern.display_for_platform(options.platform),
                id: binding.pattern_id,
                pattern: binding.pattern,
                actions: vec![binding.action_id],
                disabled: false,
                order,
            });
        }

        if options.disable_on_conflict {
            for conflict in conflicts.iter().filter(|c| c.kind == ConflictKind::Duplicate) {
                if let Some(&i) = index.get(&conflict.pattern_id) {
                    entries[i].disabled = true;
                }
            }
        }

        Self {
            entries,
            index,
            conflicts,
            platform: options.platform,
        }
    }

    /// Convenience for tests and the CLI: `(pattern, action)` pairs.
    pub fn from_pairs<'a>(
        pairs: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<Self, super::pattern::PatternParseError> {
        let bindings = pairs
            .into_iter()
            .map(|(pattern, action)| {
                Pattern::parse(pattern).map(|p| Binding::new(p, action, BindingSource::Default))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::build(bindings, KeymapOptions::default()))
    }

    pub fn entries(&self) -> &[KeymapEntry] {
        &self.entries
    }

    /// Entries that take part in live matching.
    pub fn live_entries(&self) -> impl Iterator<Item = &KeymapEntry> {
        self.entries.iter().filter(|e| !e.disabled)
    }

    pub fn get(&self, pattern_id: &str) -> Option<&KeymapEntry> {
        self.index.get(pattern_id).and_then(|&i| self.entries.get(i))
    }

    /// Pattern entries bound to `action_id`.
    pub fn patterns_for(&self, action_id: &str) -> Vec<&KeymapEntry> {
        self.entries
            .iter()
            .filter(|e| e.actions.iter().any(|a| a == action_id))
            .collect()
    }

    pub fn conflicts(&self) -> &[Conflict] {
        &self.conflicts
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Handle to the current keymap snapshot.
///
/// Readers clone the inner `Arc` and match against it; writers replace it in
/// one swap, so nobody observes a half-built keymap.
#[derive(Clone, Debug, Default)]
pub struct SharedKeymap {
    inner: Arc<RwLock<Arc<Keymap>>>,
}

impl SharedKeymap {
    pub fn new(keymap: Keymap) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(keymap))),
        }
    }

    pub fn load(&self) -> Arc<Keymap> {
        Arc::clone(&self.inner.read())
    }

    pub fn store(&self, keymap: Keymap) {
        *self.inner.write() = Arc::new(keymap);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_bindings_by_pattern() {
        let keymap = Keymap::from_pairs([("g t", "table"), ("g t", "tasks"), ("g c", "calendar")])
            .unwrap();
        assert_eq!(keymap.len(), 2);
        let entry = keymap.get("g t").unwrap();
        assert_eq!(entry.actions, vec!["table", "tasks"]);
        assert_eq!(entry.action(), Some("table"));
        assert_eq!(keymap.conflicts().len(), 1);
    }

    #[test]
    fn disable_on_conflict_removes_duplicates_from_live_matching() {
        let bindings = vec![
            Binding::new(Pattern::parse("x").unwrap(), "a", BindingSource::Default),
            Binding::new(Pattern::parse("x").unwrap(), "b", BindingSource::Default),
            Binding::new(Pattern::parse("y").unwrap(), "c", BindingSource::Default),
        ];
        let keymap = Keymap::build(
            bindings,
            KeymapOptions {
                disable_on_conflict: true,
                platform: Platform::Linux,
            },
        );
        assert_eq!(keymap.get("x").unwrap().action(), None);
        assert_eq!(keymap.live_entries().count(), 1);
    }

    #[test]
    fn shared_keymap_swaps_wholesale() {
        let shared = SharedKeymap::new(Keymap::from_pairs([("a", "one")]).unwrap());
        let before = shared.load();
        shared.store(Keymap::from_pairs([("b", "two")]).unwrap());
        assert!(before.get("a").is_some());
        assert!(shared.load().get("a").is_none());
        assert!(shared.load().get("b").is_some());
    }
}
