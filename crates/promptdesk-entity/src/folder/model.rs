//! Folder entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;

use promptdesk_core::types::FolderId;

/// A folder in the prompt hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    /// Unique folder identifier.
    pub id: FolderId,
    /// Folder name, unique among its siblings.
    pub name: String,
    /// Parent folder ID (null for root folders).
    pub parent_id: Option<FolderId>,
    /// When the folder was created.
    pub created_at: DateTime<Utc>,
    /// When the folder was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Folder {
    /// Check if this is a root folder (no parent).
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Data required to insert a folder row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFolder {
    /// Identity of the new row.
    pub id: FolderId,
    /// Folder name.
    pub name: String,
    /// Parent folder (None for root).
    pub parent_id: Option<FolderId>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

/// Rename and/or reparent a folder.
///
/// `parent_id` distinguishes "leave unchanged" (`None`) from "move to the
/// root" (`Some(None)`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderChanges {
    /// New name.
    #[serde(default)]
    pub name: Option<String>,
    /// New parent.
    #[serde(default, deserialize_with = "present_or_null")]
    pub parent_id: Option<Option<FolderId>>,
}

impl FolderChanges {
    /// Whether no field is present.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.parent_id.is_none()
    }

    /// Produce the folder as it should look once the changes are applied.
    pub fn apply(&self, folder: &Folder) -> Folder {
        let mut next = folder.clone();
        if let Some(name) = &self.name {
            next.name = name.clone();
        }
        if let Some(parent_id) = &self.parent_id {
            next.parent_id = parent_id.clone();
        }
        next
    }

    /// Whether every present field already holds its new value in `folder`.
    pub fn is_reflected_in(&self, folder: &Folder) -> bool {
        let next = self.apply(folder);
        next.name == folder.name && next.parent_id == folder.parent_id
    }
}

/// Deserialize a field that may be absent, `null`, or a value, keeping
/// `null` distinct from absence.
pub fn present_or_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
