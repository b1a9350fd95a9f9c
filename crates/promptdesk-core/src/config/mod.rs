//! Application configuration schemas.
//!
//! Configuration is deserialized via the `config` crate from an optional
//! TOML file overlaid with `PROMPTDESK__`-prefixed environment variables.
//! Every field has a default, so an empty source yields a usable config.

pub mod database;
pub mod logging;
pub mod prompts;
pub mod retry;

use serde::{Deserialize, Serialize};
use validator::Validate;

pub use self::database::DatabaseConfig;
pub use self::logging::LoggingConfig;
pub use self::prompts::PromptDefaultsConfig;
pub use self::retry::RetryConfig;

use crate::error::AppError;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct AppConfig {
    /// Shared store settings.
    #[serde(default)]
    #[validate(nested)]
    pub database: DatabaseConfig,
    /// Lock-contention retry settings.
    #[serde(default)]
    #[validate(nested)]
    pub retry: RetryConfig,
    /// Defaults for new prompts.
    #[serde(default)]
    #[validate(nested)]
    pub prompts: PromptDefaultsConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file (optional) and the environment.
    ///
    /// Environment variables use the `PROMPTDESK` prefix with `__` as the
    /// section separator, e.g. `PROMPTDESK__DATABASE__PATH`.
    pub fn load(path: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("PROMPTDESK")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let config: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;

        config.validate().map_err(|e| {
            AppError::with_source(
                crate::error::ErrorKind::Configuration,
                format!("Invalid configuration: {e}"),
                e,
            )
        })?;

        Ok(config)
    }
}
