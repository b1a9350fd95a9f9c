//! Prompt mutations.

pub mod service;

pub use service::{PromptDefaults, PromptService};
