//! Folder mutations.

pub mod cascade;
pub mod service;

pub use cascade::FolderDeletion;
pub use service::FolderService;
