//! Configuration type definitions
//!
//! This module contains all the struct and enum definitions for configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::defaults::*;
use crate::shortcuts::Platform;

// ============================================
// SEQUENCE CONFIG
// ============================================

/// What a sequence does when its timeout fires.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TimeoutPolicy {
    /// Dispatch the best exact match, cancel if there is none.
    #[default]
    CommitExact,
    /// Always cancel.
    Cancel,
}

/// What Enter does when the pending keys are not an exact match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EnterPolicy {
    /// Keep waiting.
    #[default]
    Ignore,
    /// Cancel the sequence.
    Cancel,
}

/// Settings for one capture scope's sequence state machine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SequenceConfig {
    /// Time to wait for the next key (default: 1000). `null` waits forever, so
    /// a sequence only ends on an explicit key such as Enter or Escape.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: Option<u64>,
    /// Effect of the timeout firing (default: commitExact)
    #[serde(default)]
    pub on_timeout: TimeoutPolicy,
    /// Effect of Enter with no exact match (default: ignore)
    #[serde(default)]
    pub enter_without_match: EnterPolicy,
}

fn default_timeout_ms() -> Option<u64> {
    Some(DEFAULT_SEQUENCE_TIMEOUT_MS)
}

impl Default for SequenceConfig {
    fn default() -> Self {
        SequenceConfig {
            timeout_ms: default_timeout_ms(),
            on_timeout: TimeoutPolicy::default(),
            enter_without_match: EnterPolicy::default(),
        }
    }
}

// ============================================
// SEARCH CONFIG
// ============================================

/// Settings for the command palette search
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SearchConfig {
    /// Boost applied to placeholder actions when the query carries a number (default: 50)
    #[serde(default = "default_number_boost")]
    pub number_boost: i32,
    /// Maximum number of results, 0 for unlimited (default: 50)
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

fn default_number_boost() -> i32 {
    DEFAULT_NUMBER_BOOST
}
fn default_max_results() -> usize {
    DEFAULT_MAX_SEARCH_RESULTS
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            number_boost: DEFAULT_NUMBER_BOOST,
            max_results: DEFAULT_MAX_SEARCH_RESULTS,
        }
    }
}

// ============================================
// MAIN CONFIG
// ============================================

/// Top-level configuration, read once at startup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub sequence: SequenceConfig,
    #[serde(default)]
    pub search: SearchConfig,
    /// Remove duplicate bindings from live matching (default: false)
    #[serde(default = "default_disable_on_conflict")]
    pub disable_on_conflict: bool,
    /// Force a display platform instead of detecting it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<Platform>,
    /// Entries shown by the sequence indicator (default: 8)
    #[serde(default = "default_indicator_limit")]
    pub indicator_limit: usize,
    /// Where user overrides are stored (default: ~/.shortcut-kit/overrides.json)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overrides_path: Option<PathBuf>,
}

fn default_disable_on_conflict() -> bool {
    DEFAULT_DISABLE_ON_CONFLICT
}
fn default_indicator_limit() -> usize {
    DEFAULT_INDICATOR_LIMIT
}

impl Default for Config {
    fn default() -> Self {
        Config {
            sequence: SequenceConfig::default(),
            search: SearchConfig::default(),
            disable_on_conflict: DEFAULT_DISABLE_ON_CONFLICT,
            platform: None,
            indicator_limit: DEFAULT_INDICATOR_LIMIT,
            overrides_path: None,
        }
    }
}

impl Config {
    /// Platform used for display strings.
    pub fn display_platform(&self) -> Platform {
        self.platform.unwrap_or_else(Platform::current)
    }

    pub fn keymap_options(&self) -> crate::shortcuts::KeymapOptions {
        crate::shortcuts::KeymapOptions {
            disable_on_conflict: self.disable_on_conflict,
            platform: self.display_platform(),
        }
    }

    pub fn get_overrides_path(&self) -> PathBuf {
        self.overrides_path
            .clone()
            .unwrap_or_else(crate::shortcuts::default_overrides_path)
    }
}
