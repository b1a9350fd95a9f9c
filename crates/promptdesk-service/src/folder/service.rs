//! Folder create, update and delete.

use std::sync::Arc;

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};
use validator::Validate;

use promptdesk_core::error::AppError;
use promptdesk_core::result::AppResult;
use promptdesk_core::types::FolderId;
use promptdesk_database::RetryPolicy;
use promptdesk_database::error::map_sqlx_error;
use promptdesk_database::repositories::{FolderRepository, PromptRepository};
use promptdesk_entity::folder::{CreateFolder, Folder, FolderChanges};

use super::cascade::{self, FolderDeletion};
use crate::integrity::IntegrityChecker;
use crate::requests::{
    CreateFolderRequest, DeleteFolderRequest, UpdateFolderRequest, require_confirmation,
};
use crate::verify;

/// Applies folder mutations to the shared store.
#[derive(Debug, Clone)]
pub struct FolderService {
    /// Store connection.
    pool: SqlitePool,
    /// Folder repository.
    folder_repo: Arc<FolderRepository>,
    /// Prompt repository, for cascading deletes.
    prompt_repo: Arc<PromptRepository>,
    /// Pre-mutation checks.
    integrity: Arc<IntegrityChecker>,
    /// Lock-contention retry policy.
    retry: RetryPolicy,
}

impl FolderService {
    /// Creates a new folder service.
    pub fn new(
        pool: SqlitePool,
        folder_repo: Arc<FolderRepository>,
        prompt_repo: Arc<PromptRepository>,
        integrity: Arc<IntegrityChecker>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            pool,
            folder_repo,
            prompt_repo,
            integrity,
            retry,
        }
    }

    /// Gets a folder by ID.
    pub async fn get_folder(&self, id: &FolderId) -> AppResult<Folder> {
        self.integrity.require_folder(id).await
    }

    /// Lists folders: all of them, or the direct children of one parent
    /// (`Some(None)` for the root level).
    pub async fn list_folders(&self, parent: Option<Option<&FolderId>>) -> AppResult<Vec<Folder>> {
        match parent {
            None => self.folder_repo.find_all().await,
            Some(parent_id) => {
                self.integrity.require_target_folder(parent_id).await?;
                self.folder_repo.find_children(parent_id).await
            }
        }
    }

    /// Creates a new folder.
    pub async fn create_folder(&self, req: CreateFolderRequest) -> AppResult<Folder> {
        req.validate()?;

        if let Some(id) = &req.id {
            if let Some(existing) = self.folder_repo.find_by_id(id).await? {
                return replayed_create(existing, &req);
            }
        }

        self.integrity
            .require_target_folder(req.parent_id.as_ref())
            .await?;

        let now = Utc::now();
        let record = CreateFolder {
            id: req.id.unwrap_or_default(),
            name: req.name,
            parent_id: req.parent_id,
            created_at: now,
            updated_at: now,
        };

        let folder = self
            .retry
            .run("create_folder", || self.insert_once(&record))
            .await?;

        let found = self.folder_repo.find_by_id(&folder.id).await?;
        let folder = verify::folder_written(found, &folder)?;

        info!(
            folder_id = %folder.id,
            parent_id = ?folder.parent_id,
            name = %folder.name,
            "Folder created"
        );

        Ok(folder)
    }

    /// Renames and/or reparents a folder.
    ///
    /// The hierarchy checks run again inside the writing transaction
    /// against the row as it is then, so a concurrent host reparent is
    /// kept rather than reverted.
    pub async fn update_folder(&self, req: UpdateFolderRequest) -> AppResult<Folder> {
        req.validate()?;

        let changes = req.changes();
        let current = self.integrity.require_folder(&req.folder_id).await?;
        if changes.is_reflected_in(&current) {
            debug!(folder_id = %current.id, "Folder update changes nothing");
            return Ok(current);
        }

        if let Some(parent_id) = &changes.parent_id {
            self.integrity
                .require_target_folder(parent_id.as_ref())
                .await?;
        }

        let updated = self
            .retry
            .run("update_folder", || self.update_once(&current.id, &changes))
            .await?;

        let found = self.folder_repo.find_by_id(&updated.id).await?;
        let folder = verify::folder_changes_written(found, &updated.id, &changes)?;

        info!(
            folder_id = %folder.id,
            parent_id = ?folder.parent_id,
            renamed = changes.name.is_some(),
            moved = changes.parent_id.is_some(),
            "Folder updated"
        );

        Ok(folder)
    }

    /// Deletes a folder. Without `recursive` the folder must be empty; with
    /// it the whole subtree goes in one transaction.
    pub async fn delete_folder(&self, req: DeleteFolderRequest) -> AppResult<FolderDeletion> {
        require_confirmation(req.confirm, &format!("folder '{}'", req.folder_id))?;

        let folder = self.integrity.require_folder(&req.folder_id).await?;

        if !req.recursive {
            let contents = self.integrity.folder_contents(&folder.id).await?;
            if !contents.is_empty() {
                return Err(AppError::not_empty(format!(
                    "Folder '{}' contains {} folder(s) and {} prompt(s); delete it recursively",
                    folder.name, contents.folders, contents.prompts
                )));
            }
        }

        let deletion = self
            .retry
            .run("delete_folder", || self.delete_once(&folder.id, req.recursive))
            .await?;

        for id in &deletion.removed_folders {
            let found = self.folder_repo.find_by_id(id).await?;
            verify::removed(found, "Folder", id.as_str())?;
        }

        info!(
            folder_id = %folder.id,
            recursive = req.recursive,
            folders_deleted = deletion.folders_deleted,
            prompts_deleted = deletion.prompts_deleted,
            "Folder deleted"
        );

        Ok(deletion)
    }

    async fn insert_once(&self, record: &CreateFolder) -> AppResult<Folder> {
        let mut tx = self.begin().await?;
        self.integrity
            .ensure_unique_name(&mut *tx, &record.name, record.parent_id.as_ref(), None)
            .await?;
        let folder = self.folder_repo.insert_tx(&mut *tx, record).await?;
        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("Failed to commit folder creation", e))?;
        Ok(folder)
    }

    async fn update_once(&self, id: &FolderId, changes: &FolderChanges) -> AppResult<Folder> {
        let mut tx = self.begin().await?;
        let fresh = self
            .folder_repo
            .find_by_id_tx(&mut *tx, id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Folder '{id}' not found")))?;

        if changes.is_reflected_in(&fresh) {
            debug!(folder_id = %id, "Folder already holds the requested values");
            return Ok(fresh);
        }

        let next = changes.apply(&fresh);
        if next.parent_id != fresh.parent_id {
            self.integrity
                .ensure_no_cycle(&mut *tx, id, next.parent_id.as_ref())
                .await?;
        }
        self.integrity
            .ensure_unique_name(&mut *tx, &next.name, next.parent_id.as_ref(), Some(id))
            .await?;

        let folder = self
            .folder_repo
            .update_tx(&mut *tx, &next, Utc::now())
            .await?
            .ok_or_else(|| AppError::not_found(format!("Folder '{id}' not found")))?;
        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("Failed to commit folder update", e))?;
        Ok(folder)
    }

    async fn delete_once(&self, id: &FolderId, recursive: bool) -> AppResult<FolderDeletion> {
        let mut tx = self.begin().await?;
        let deletion = if recursive {
            cascade::delete_subtree_tx(&self.folder_repo, &self.prompt_repo, &mut *tx, id).await?
        } else {
            if !self.folder_repo.delete_tx(&mut *tx, id).await? {
                return Err(AppError::not_found(format!("Folder '{id}' not found")));
            }
            FolderDeletion {
                folders_deleted: 1,
                prompts_deleted: 0,
                removed_folders: vec![id.clone()],
            }
        };
        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("Failed to commit folder deletion", e))?;
        Ok(deletion)
    }

    async fn begin(&self) -> AppResult<sqlx::Transaction<'static, sqlx::Sqlite>> {
        self.pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("Failed to begin transaction", e))
    }
}

/// A create carrying an id that already exists is a replay when the fields
/// match, and a conflict otherwise.
fn replayed_create(existing: Folder, req: &CreateFolderRequest) -> AppResult<Folder> {
    if existing.name == req.name && existing.parent_id == req.parent_id {
        info!(folder_id = %existing.id, "Folder create replayed, returning existing folder");
        Ok(existing)
    } else {
        Err(AppError::conflict(format!(
            "Folder id '{}' is already used by a different folder",
            existing.id
        )))
    }
}
