//! Configuration module - engine settings and user preferences
//!
//! This module provides functionality for:
//! - Loading configuration from ~/.shortcut-kit/config.json
//! - Default values for all settings
//! - Type definitions for config structures
//!
//! # Module Structure
//!
//! - `defaults` - All default constant values
//! - `types` - Configuration struct definitions (Config, SequenceConfig, etc.)
//! - `loader` - File system loading and parsing

mod defaults;
mod loader;
mod types;

pub use defaults::{DEFAULT_INDICATOR_LIMIT, DEFAULT_SEQUENCE_TIMEOUT_MS};

pub use types::{Config, EnterPolicy, SearchConfig, SequenceConfig, TimeoutPolicy};

pub use loader::{default_config_path, load_config, try_load_config, ConfigError};

#[cfg(test)]
pub use defaults::{DEFAULT_MAX_SEARCH_RESULTS, DEFAULT_NUMBER_BOOST};

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
