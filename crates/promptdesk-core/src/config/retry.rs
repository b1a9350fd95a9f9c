//! Lock-contention retry configuration.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Bounded exponential backoff applied when the store reports contention.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RetryConfig {
    /// Total attempts, including the first one.
    #[serde(default = "default_max_attempts")]
    #[validate(range(min = 1, max = 10))]
    pub max_attempts: u32,
    /// Sleep before the second attempt, in milliseconds.
    #[serde(default = "default_base_delay")]
    #[validate(range(min = 1, max = 1000))]
    pub base_delay_ms: u64,
    /// Growth factor applied to each subsequent sleep.
    #[serde(default = "default_multiplier")]
    #[validate(range(min = 1, max = 10))]
    pub multiplier: u32,
    /// Upper bound on a single sleep, in milliseconds.
    #[serde(default = "default_max_delay")]
    #[validate(range(min = 1, max = 5000))]
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay(),
            multiplier: default_multiplier(),
            max_delay_ms: default_max_delay(),
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay() -> u64 {
    25
}

fn default_multiplier() -> u32 {
    2
}

fn default_max_delay() -> u64 {
    200
}
