//! Backup file format.
//!
//! A snapshot is the full folder and prompt set of a store at one point in
//! time. Identifiers inside a snapshot are local to it: restore remaps them
//! onto live identities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use promptdesk_core::types::{FolderId, PromptId};

use crate::folder::Folder;
use crate::prompt::{Prompt, PromptColor};

/// Current snapshot format version.
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// An exported folder/prompt set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupSnapshot {
    /// Format version.
    #[serde(default = "default_version")]
    pub version: u32,
    /// When the snapshot was taken.
    #[serde(default)]
    pub exported_at: Option<DateTime<Utc>>,
    /// Folders in any order.
    #[serde(default)]
    pub folders: Vec<SnapshotFolder>,
    /// Prompts in any order.
    #[serde(default)]
    pub prompts: Vec<SnapshotPrompt>,
}

fn default_version() -> u32 {
    SNAPSHOT_FORMAT_VERSION
}

impl BackupSnapshot {
    /// Build a snapshot from live rows.
    pub fn capture(folders: &[Folder], prompts: &[Prompt]) -> Self {
        Self {
            version: SNAPSHOT_FORMAT_VERSION,
            exported_at: Some(Utc::now()),
            folders: folders.iter().map(SnapshotFolder::from).collect(),
            prompts: prompts.iter().map(SnapshotPrompt::from).collect(),
        }
    }
}

/// A folder as recorded in a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotFolder {
    /// Snapshot-local identifier.
    pub id: FolderId,
    /// Folder name.
    pub name: String,
    /// Snapshot-local parent identifier.
    #[serde(default)]
    pub parent_id: Option<FolderId>,
    /// Original creation time.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Original update time.
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<&Folder> for SnapshotFolder {
    fn from(folder: &Folder) -> Self {
        Self {
            id: folder.id.clone(),
            name: folder.name.clone(),
            parent_id: folder.parent_id.clone(),
            created_at: Some(folder.created_at),
            updated_at: Some(folder.updated_at),
        }
    }
}

/// A prompt as recorded in a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotPrompt {
    /// Snapshot-local identifier.
    pub id: PromptId,
    /// Display title.
    pub title: String,
    /// Prompt body.
    #[serde(default)]
    pub content: String,
    /// Snapshot-local folder identifier.
    #[serde(default)]
    pub folder_id: Option<FolderId>,
    /// Decorative marker.
    #[serde(default)]
    pub emoji: Option<String>,
    /// Color tag.
    #[serde(default)]
    pub color: Option<PromptColor>,
    /// Related link.
    #[serde(default)]
    pub url: Option<String>,
    /// Original creation time.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Original update time.
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<&Prompt> for SnapshotPrompt {
    fn from(prompt: &Prompt) -> Self {
        Self {
            id: prompt.id.clone(),
            title: prompt.title.clone(),
            content: prompt.content.clone(),
            folder_id: prompt.folder_id.clone(),
            emoji: prompt.emoji.clone(),
            color: prompt.color,
            url: prompt.url.clone(),
            created_at: Some(prompt.created_at),
            updated_at: Some(prompt.updated_at),
        }
    }
}

/// Counts reported by a restore.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreSummary {
    /// Folders inserted (fresh or as replacements).
    pub folders_created: usize,
    /// Folders matched to an existing live folder and left alone.
    pub folders_skipped: usize,
    /// Existing folders whose subtree was replaced.
    pub folders_replaced: usize,
    /// Prompts inserted (fresh or as replacements).
    pub prompts_created: usize,
    /// Prompts matched to an existing live prompt and left alone.
    pub prompts_skipped: usize,
    /// Existing prompts that were replaced.
    pub prompts_replaced: usize,
}
