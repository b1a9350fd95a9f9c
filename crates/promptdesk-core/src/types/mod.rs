//! Core type definitions used across the PromptDesk workspace.

pub mod id;
pub mod outcome;

pub use id::{FolderId, IdParseError, PromptId};
pub use outcome::{OperationOutcome, OutcomeStatus};
