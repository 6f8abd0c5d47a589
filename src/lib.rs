//! shortcut-kit - keyboard shortcut patterns, sequences and command search
//!
//! This library resolves normalized key events against a keymap of
//! single keys, modified keys and multi-key sequences (with number
//! placeholders), and provides the fuzzy search and completion used by a
//! command palette.

pub mod config;
pub mod error;
pub mod logging;
pub mod search;
pub mod shortcuts;
