//! Runtime configuration read from the environment.
//!
//! `main` loads a `.env` file (if present) with `dotenvy` before calling
//! [`FeedConfig::from_env`]. CLI flags override these values.

use std::path::PathBuf;

/// Files at or above this size are not converted to UTF-8 (100 MiB).
pub const DEFAULT_NORMALIZE_LIMIT: u64 = 100 * 1024 * 1024;

/// Bytes read from the export per pull-mode read.
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// Reader configuration
#[derive(Debug, Clone, PartialEq)]
pub struct FeedConfig {
    /// Default product list descriptor (`MYSHOP_FEED_DESCRIPTOR`)
    pub descriptor_path: Option<PathBuf>,
    /// UTF-8 normalization size limit in bytes (`MYSHOP_FEED_NORMALIZE_LIMIT`)
    pub normalize_limit: u64,
    /// Pull-mode read size in bytes (`MYSHOP_FEED_CHUNK_SIZE`)
    pub chunk_size: usize,
    /// Print debug log entries (`MYSHOP_FEED_VERBOSE`)
    pub verbose: bool,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            descriptor_path: None,
            normalize_limit: DEFAULT_NORMALIZE_LIMIT,
            chunk_size: DEFAULT_CHUNK_SIZE,
            verbose: false,
        }
    }
}

impl FeedConfig {
    /// Build the configuration from process environment variables.
    ///
    /// Unset or unparseable values fall back to the defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            descriptor_path: lookup("MYSHOP_FEED_DESCRIPTOR")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
            normalize_limit: lookup("MYSHOP_FEED_NORMALIZE_LIMIT")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.normalize_limit),
            chunk_size: lookup("MYSHOP_FEED_CHUNK_SIZE")
                .and_then(|v| v.trim().parse().ok())
                .filter(|size: &usize| *size > 0)
                .unwrap_or(defaults.chunk_size),
            verbose: lookup("MYSHOP_FEED_VERBOSE")
                .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(defaults.verbose),
        }
    }
}
