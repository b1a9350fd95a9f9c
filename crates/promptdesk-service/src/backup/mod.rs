//! Backup export and restore.

pub mod ordering;
pub mod reconciler;

pub use reconciler::BackupReconciler;
