//! Default configuration values
//!
//! All constants used throughout the config module are defined here.

/// Default time a pending sequence waits for its next key (milliseconds)
pub const DEFAULT_SEQUENCE_TIMEOUT_MS: u64 = 1000;

/// Default conflict handling: report duplicates but keep them live
pub const DEFAULT_DISABLE_ON_CONFLICT: bool = false;

/// Default number of entries in the always-visible sequence indicator
pub const DEFAULT_INDICATOR_LIMIT: usize = 8;

/// Default score boost for placeholder actions when the query carries a number
pub const DEFAULT_NUMBER_BOOST: i32 = 50;

/// Default cap on search results (0 = unlimited)
pub const DEFAULT_MAX_SEARCH_RESULTS: usize = 50;
