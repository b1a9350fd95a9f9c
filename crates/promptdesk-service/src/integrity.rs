//! Referential integrity checks run before a mutation.
//!
//! Every check is a read-only query against the live store. They exist to
//! produce precise errors; the store's own foreign-key and uniqueness
//! constraints still reject anything that slips through between the check
//! and the commit. The hierarchy checks take the connection of the
//! transaction that will write, so they see the same rows the write does.

use std::collections::BTreeSet;
use std::sync::Arc;

use sqlx::SqliteConnection;
use tracing::warn;

use promptdesk_core::error::AppError;
use promptdesk_core::result::AppResult;
use promptdesk_core::types::{FolderId, PromptId};
use promptdesk_database::repositories::{FolderRepository, PromptRepository};
use promptdesk_entity::folder::Folder;
use promptdesk_entity::prompt::Prompt;

/// What a folder directly contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FolderContents {
    /// Direct child folders.
    pub folders: u64,
    /// Prompts filed directly in the folder.
    pub prompts: u64,
}

impl FolderContents {
    /// Whether the folder holds nothing.
    pub fn is_empty(&self) -> bool {
        self.folders == 0 && self.prompts == 0
    }
}

/// Verifies existence, acyclicity and sibling-name uniqueness.
#[derive(Debug, Clone)]
pub struct IntegrityChecker {
    /// Folder repository.
    folder_repo: Arc<FolderRepository>,
    /// Prompt repository.
    prompt_repo: Arc<PromptRepository>,
}

impl IntegrityChecker {
    /// Creates a new integrity checker.
    pub fn new(folder_repo: Arc<FolderRepository>, prompt_repo: Arc<PromptRepository>) -> Self {
        Self {
            folder_repo,
            prompt_repo,
        }
    }

    /// Load a folder or fail with `NOT_FOUND`.
    pub async fn require_folder(&self, id: &FolderId) -> AppResult<Folder> {
        self.folder_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Folder '{id}' not found")))
    }

    /// Load a prompt or fail with `NOT_FOUND`.
    pub async fn require_prompt(&self, id: &PromptId) -> AppResult<Prompt> {
        self.prompt_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Prompt '{id}' not found")))
    }

    /// Check that a referenced folder exists, when there is a reference.
    pub async fn require_target_folder(&self, id: Option<&FolderId>) -> AppResult<()> {
        if let Some(id) = id {
            self.require_folder(id).await?;
        }
        Ok(())
    }

    /// Reject reparenting `folder_id` under `new_parent` if that would make
    /// the folder its own ancestor.
    ///
    /// Walks parent references upward from `new_parent` until the chain
    /// ends. Meeting `folder_id` on the way is a cycle. Meeting any folder
    /// twice means the stored hierarchy is already cyclic, which is
    /// rejected the same way rather than followed forever.
    pub async fn ensure_no_cycle(
        &self,
        conn: &mut SqliteConnection,
        folder_id: &FolderId,
        new_parent: Option<&FolderId>,
    ) -> AppResult<()> {
        let mut visited = BTreeSet::new();
        let mut current = new_parent.cloned();

        while let Some(id) = current {
            if &id == folder_id {
                return Err(AppError::cycle(format!(
                    "Moving folder '{folder_id}' under '{}' would make it its own ancestor",
                    new_parent.map(FolderId::as_str).unwrap_or_default()
                )));
            }
            if !visited.insert(id.clone()) {
                warn!(folder_id = %id, "Stored folder hierarchy already contains a cycle");
                return Err(AppError::cycle(format!(
                    "The ancestors of folder '{id}' form a cycle"
                )));
            }
            current = self
                .folder_repo
                .find_parent_id_tx(&mut *conn, &id)
                .await?
                .flatten();
        }

        Ok(())
    }

    /// Reject a folder name already used by a sibling under `parent_id`.
    ///
    /// `exclude` is the folder being renamed or moved, which may keep its
    /// own name.
    pub async fn ensure_unique_name(
        &self,
        conn: &mut SqliteConnection,
        name: &str,
        parent_id: Option<&FolderId>,
        exclude: Option<&FolderId>,
    ) -> AppResult<()> {
        match self
            .folder_repo
            .find_sibling_tx(conn, name, parent_id)
            .await?
        {
            Some(existing) if Some(&existing.id) != exclude => {
                Err(AppError::conflict(match parent_id {
                    Some(parent) => format!("A folder named '{name}' already exists in '{parent}'"),
                    None => format!("A root folder named '{name}' already exists"),
                }))
            }
            _ => Ok(()),
        }
    }

    /// Count what a folder directly contains.
    pub async fn folder_contents(&self, id: &FolderId) -> AppResult<FolderContents> {
        Ok(FolderContents {
            folders: self.folder_repo.count_children(id).await?,
            prompts: self.prompt_repo.count_in_folder(id).await?,
        })
    }
}
