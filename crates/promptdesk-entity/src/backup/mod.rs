//! Backup snapshot entities.

pub mod snapshot;

pub use snapshot::{BackupSnapshot, RestoreSummary, SnapshotFolder, SnapshotPrompt};
