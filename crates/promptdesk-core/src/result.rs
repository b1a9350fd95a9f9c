//! Convenience result type alias for PromptDesk.

use crate::error::AppError;

/// A specialized `Result` type for PromptDesk operations.
pub type AppResult<T> = Result<T, AppError>;
