//! Shared store configuration.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Location and connection behaviour of the shared SQLite store.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DatabaseConfig {
    /// Path to the store file owned by the host application.
    #[serde(default = "default_path")]
    #[validate(length(min = 1))]
    pub path: String,
    /// How long SQLite's busy handler waits on a locked store before a
    /// statement reports contention, in milliseconds.
    #[serde(default = "default_busy_timeout")]
    #[validate(range(max = 5000))]
    pub busy_timeout_ms: u64,
    /// The structural version marker (`PRAGMA user_version`) this engine
    /// was built against.
    #[serde(default = "default_schema_version")]
    pub expected_schema_version: i64,
    /// How long a caller waits for the single writer connection, in seconds.
    #[serde(default = "default_acquire_timeout")]
    #[validate(range(min = 1, max = 300))]
    pub acquire_timeout_seconds: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
            busy_timeout_ms: default_busy_timeout(),
            expected_schema_version: default_schema_version(),
            acquire_timeout_seconds: default_acquire_timeout(),
        }
    }
}

fn default_path() -> String {
    "prompts.sqlite".to_string()
}

fn default_busy_timeout() -> u64 {
    50
}

fn default_schema_version() -> i64 {
    1
}

fn default_acquire_timeout() -> u64 {
    10
}
