//! Keyboard shortcut patterns and sequence matching.
//!
//! This module provides:
//! - Key normalization from raw host events
//! - Pattern parsing, including `\d+` and `\f` number placeholders
//! - Matching of pending keys against a compiled keymap
//! - A per-scope sequence state machine with timeout handling
//! - Conflict detection, completions and override persistence
//!
//! # Architecture
//!
//! The `ShortcutRegistry` owns actions and their bindings. Every change
//! rebuilds an immutable `Keymap` and publishes it through a `SharedKeymap`.
//! Each capture scope runs its own `SequenceStateMachine` against whatever
//! snapshot is current when a key arrives.
//!
//! # Example
//!
//! ```ignore
//! use shortcut_kit::shortcuts::{ActionDefinition, ShortcutRegistry, SequenceStateMachine};
//!
//! let mut registry = ShortcutRegistry::default();
//! registry.register(ActionDefinition::new("due", "Set due date").with_pattern("\\d+ d"))?;
//! let mut machine = SequenceStateMachine::new(registry.shared_keymap(), Default::default());
//! ```

mod completion;
mod conflicts;
mod keymap;
mod matcher;
mod pattern;
mod persistence;
mod registry;
mod sequence;
mod timer;
mod types;



pub use types::{
    canonicalize_key, is_known_key, is_modifier_key, normalize_key_event, KeyCombination,
    KeyEvent, Modifiers, Platform,
};

pub use pattern::{
    Pattern, PatternFormat, PatternParseError, PlaceholderKind, Token, DIGIT_RUN_SYNTAX,
    FLOAT_SYNTAX,
};

pub use matcher::{
    evaluate, match_pattern, pending_display, CapturedValue, Captures, ContinuingMatch,
    ExactMatch, Expectation, MatchSet, PatternProgress,
};

pub use keymap::{Binding, BindingSource, Keymap, KeymapEntry, KeymapOptions, SharedKeymap};

pub use conflicts::{conflicts_for, detect_conflicts, Conflict, ConflictKind};

pub use timer::{TimeoutClock, TimerToken};

pub use sequence::{
    params_as_f64, CancelReason, Commit, CommitTrigger, NoopListener, PendingState,
    SequenceListener, SequenceStateMachine, SequenceStep,
};

pub use completion::{complete, indicator, SequenceCompletion, SequenceIndicator};

pub use registry::{ActionDefinition, ImportSummary, RegistryError, ShortcutRegistry};

pub use persistence::{
    default_overrides_path, ImportError, OverrideDocument, ParsedOverrides, PersistenceError,
};
