//! # promptdesk-service
//!
//! The write path of PromptDesk. Services run fast-fail integrity checks
//! against the shared store, apply each mutation inside one short
//! transaction retried on lock contention, and re-read the result before
//! reporting success.
//!
//! Services follow constructor injection: repositories and the retry
//! policy are provided at construction time. [`PromptEngine`] wires them
//! together and is the only type callers need.

pub mod backup;
pub mod engine;
pub mod folder;
pub mod integrity;
pub mod prompt;
pub mod requests;
pub mod verify;

pub use backup::BackupReconciler;
pub use engine::PromptEngine;
pub use folder::FolderService;
pub use integrity::IntegrityChecker;
pub use prompt::PromptService;
