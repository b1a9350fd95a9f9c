//! Repository implementations for folders and prompts.
//!
//! Reads run against the pool; writes take the connection of an open
//! transaction so a caller can compose several of them atomically.

pub mod folder;
pub mod prompt;

pub use folder::FolderRepository;
pub use prompt::PromptRepository;
