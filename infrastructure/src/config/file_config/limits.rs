//! Retry, concurrency and timeout settings (`[limits]` and `[timeouts]`)

use serde::{Deserialize, Serialize};

/// Raw request limits from TOML
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLimitsConfig {
    /// Retries after the first attempt when rate limited
    pub max_retries: u32,
    /// Base of the exponential backoff, in seconds
    pub backoff_factor: u32,
    /// Upstream requests allowed in flight at once
    pub concurrency: usize,
}

impl Default for FileLimitsConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_factor: 2,
            concurrency: 2,
        }
    }
}

/// Raw timeouts from TOML, in seconds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileTimeoutsConfig {
    /// Per-attempt timeout for council and chairman queries
    pub query_seconds: u64,
    /// Per-attempt timeout for title generation
    pub title_seconds: u64,
    /// How long a streamed reply waits for a pending title
    pub title_wait_seconds: u64,
}

impl Default for FileTimeoutsConfig {
    fn default() -> Self {
        Self {
            query_seconds: 120,
            title_seconds: 30,
            title_wait_seconds: 5,
        }
    }
}
