//! Prompt domain entities.

pub mod color;
pub mod model;

pub use color::PromptColor;
pub use model::{CreatePrompt, Prompt, PromptChanges};
