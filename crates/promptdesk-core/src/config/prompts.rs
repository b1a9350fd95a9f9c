//! Defaults applied to newly created prompts.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Decorative defaults filled in when a create request leaves them unset.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PromptDefaultsConfig {
    /// Emoji marker for new prompts.
    #[serde(default = "default_emoji")]
    #[validate(length(min = 1, max = 2))]
    pub default_emoji: String,
    /// Color name for new prompts; must be one of the prompt color values.
    #[serde(default = "default_color")]
    pub default_color: String,
}

impl Default for PromptDefaultsConfig {
    fn default() -> Self {
        Self {
            default_emoji: default_emoji(),
            default_color: default_color(),
        }
    }
}

fn default_emoji() -> String {
    "📝".to_string()
}

fn default_color() -> String {
    "gray".to_string()
}
