//! The engine facade handed to the caller layer.
//!
//! Every public operation returns an [`OperationOutcome`]; typed errors
//! never cross this boundary. The full error, source included, is logged
//! here before it is folded into a code and a message.

use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, warn};

use promptdesk_core::config::AppConfig;
use promptdesk_core::error::{AppError, ErrorKind};
use promptdesk_core::result::AppResult;
use promptdesk_core::types::{FolderId, OperationOutcome, PromptId};
use promptdesk_database::repositories::{FolderRepository, PromptRepository};
use promptdesk_database::{RetryPolicy, StoreHandle};
use promptdesk_entity::backup::BackupSnapshot;

use crate::backup::BackupReconciler;
use crate::folder::FolderService;
use crate::integrity::IntegrityChecker;
use crate::prompt::{PromptDefaults, PromptService};
use crate::requests::{
    CreateFolderRequest, CreatePromptRequest, DeleteFolderRequest, DeletePromptRequest,
    MovePromptRequest, UpdateFolderRequest, UpdatePromptRequest,
};

/// Write-path engine over one store handle.
#[derive(Debug, Clone)]
pub struct PromptEngine {
    /// The owned store handle.
    store: StoreHandle,
    /// Folder mutations.
    folders: Arc<FolderService>,
    /// Prompt mutations.
    prompts: Arc<PromptService>,
    /// Backup export and restore.
    backup: Arc<BackupReconciler>,
}

impl PromptEngine {
    /// Open the configured store for writing and build the engine.
    pub async fn open(config: &AppConfig) -> AppResult<Self> {
        let store = StoreHandle::open(&config.database).await?;
        Self::from_handle(store, config)
    }

    /// Open the configured store read-only. Mutations on the resulting
    /// engine report `CONFIGURATION`.
    pub async fn open_read_only(config: &AppConfig) -> AppResult<Self> {
        let store = StoreHandle::open_read_only(&config.database).await?;
        Self::from_handle(store, config)
    }

    /// Build the engine over an already opened handle.
    pub fn from_handle(store: StoreHandle, config: &AppConfig) -> AppResult<Self> {
        let defaults = PromptDefaults::from_config(&config.prompts)?;
        let retry = RetryPolicy::from_config(&config.retry);
        let pool = store.pool().clone();

        let folder_repo = Arc::new(FolderRepository::new(pool.clone()));
        let prompt_repo = Arc::new(PromptRepository::new(pool.clone()));
        let integrity = Arc::new(IntegrityChecker::new(
            Arc::clone(&folder_repo),
            Arc::clone(&prompt_repo),
        ));

        let folders = Arc::new(FolderService::new(
            pool.clone(),
            Arc::clone(&folder_repo),
            Arc::clone(&prompt_repo),
            Arc::clone(&integrity),
            retry.clone(),
        ));
        let prompts = Arc::new(PromptService::new(
            pool.clone(),
            Arc::clone(&prompt_repo),
            integrity,
            retry.clone(),
            defaults,
        ));
        let backup = Arc::new(BackupReconciler::new(pool, folder_repo, prompt_repo, retry));

        info!(
            path = %store.path().display(),
            read_only = store.is_read_only(),
            max_attempts = config.retry.max_attempts,
            "Prompt engine ready"
        );

        Ok(Self {
            store,
            folders,
            prompts,
            backup,
        })
    }

    /// The underlying store handle.
    pub fn store(&self) -> &StoreHandle {
        &self.store
    }

    /// Typed access to the folder service.
    pub fn folders(&self) -> &FolderService {
        &self.folders
    }

    /// Typed access to the prompt service.
    pub fn prompts(&self) -> &PromptService {
        &self.prompts
    }

    // -- Folders --

    /// Create a folder.
    pub async fn create_folder(&self, req: CreateFolderRequest) -> OperationOutcome {
        let result = match self.writable("create_folder") {
            Ok(()) => self.folders.create_folder(req).await,
            Err(err) => Err(err),
        };
        outcome("create_folder", result, |f| {
            (Some(f.id.to_string()), format!("Folder '{}' created", f.name))
        })
    }

    /// Rename and/or reparent a folder.
    pub async fn update_folder(&self, req: UpdateFolderRequest) -> OperationOutcome {
        let result = match self.writable("update_folder") {
            Ok(()) => self.folders.update_folder(req).await,
            Err(err) => Err(err),
        };
        outcome("update_folder", result, |f| {
            (Some(f.id.to_string()), format!("Folder '{}' updated", f.name))
        })
    }

    /// Delete a folder, optionally with its whole subtree.
    pub async fn delete_folder(&self, req: DeleteFolderRequest) -> OperationOutcome {
        let id = req.folder_id.to_string();
        let result = match self.writable("delete_folder") {
            Ok(()) => self.folders.delete_folder(req).await,
            Err(err) => Err(err),
        };
        outcome("delete_folder", result, |d| {
            (
                Some(id.clone()),
                format!(
                    "Deleted {} folder(s) and {} prompt(s)",
                    d.folders_deleted, d.prompts_deleted
                ),
            )
        })
    }

    /// Look up one folder.
    pub async fn get_folder(&self, id: &FolderId) -> OperationOutcome {
        let result = self.folders.get_folder(id).await;
        outcome("get_folder", result, |f| {
            (Some(f.id.to_string()), format!("Folder '{}'", f.name))
        })
    }

    /// List all folders, or the children of one parent (`Some(None)` for
    /// the root level).
    pub async fn list_folders(&self, parent: Option<Option<&FolderId>>) -> OperationOutcome {
        let result = self.folders.list_folders(parent).await;
        outcome("list_folders", result, |list| {
            (None, format!("{} folder(s)", list.len()))
        })
    }

    // -- Prompts --

    /// Create a prompt.
    pub async fn create_prompt(&self, req: CreatePromptRequest) -> OperationOutcome {
        let result = match self.writable("create_prompt") {
            Ok(()) => self.prompts.create_prompt(req).await,
            Err(err) => Err(err),
        };
        outcome("create_prompt", result, |p| {
            (Some(p.id.to_string()), format!("Prompt '{}' created", p.title))
        })
    }

    /// Apply a partial update to a prompt.
    pub async fn update_prompt(&self, req: UpdatePromptRequest) -> OperationOutcome {
        let result = match self.writable("update_prompt") {
            Ok(()) => self.prompts.update_prompt(req).await,
            Err(err) => Err(err),
        };
        outcome("update_prompt", result, |p| {
            (Some(p.id.to_string()), format!("Prompt '{}' updated", p.title))
        })
    }

    /// Delete a prompt.
    pub async fn delete_prompt(&self, req: DeletePromptRequest) -> OperationOutcome {
        let result = match self.writable("delete_prompt") {
            Ok(()) => self.prompts.delete_prompt(req).await,
            Err(err) => Err(err),
        };
        outcome("delete_prompt", result, |p| {
            (Some(p.id.to_string()), format!("Prompt '{}' deleted", p.title))
        })
    }

    /// Move a prompt into a folder, or out of every folder.
    pub async fn move_prompt(&self, req: MovePromptRequest) -> OperationOutcome {
        let result = match self.writable("move_prompt") {
            Ok(()) => self.prompts.move_prompt(req).await,
            Err(err) => Err(err),
        };
        outcome("move_prompt", result, |p| {
            let target = p
                .folder_id
                .as_ref()
                .map_or_else(|| "no folder".to_string(), |f| format!("folder '{f}'"));
            (
                Some(p.id.to_string()),
                format!("Prompt '{}' moved to {target}", p.title),
            )
        })
    }

    /// Look up one prompt.
    pub async fn get_prompt(&self, id: &PromptId) -> OperationOutcome {
        let result = self.prompts.get_prompt(id).await;
        outcome("get_prompt", result, |p| {
            (Some(p.id.to_string()), format!("Prompt '{}'", p.title))
        })
    }

    /// List all prompts, or those of one folder (`Some(None)` for unfiled
    /// prompts).
    pub async fn list_prompts(&self, folder: Option<Option<&FolderId>>) -> OperationOutcome {
        let result = self.prompts.list_prompts(folder).await;
        outcome("list_prompts", result, |list| {
            (None, format!("{} prompt(s)", list.len()))
        })
    }

    // -- Backup --

    /// Capture the whole store as a snapshot.
    pub async fn snapshot(&self) -> AppResult<BackupSnapshot> {
        self.backup.export().await
    }

    /// Capture the whole store and return it as the outcome payload.
    pub async fn export_backup(&self) -> OperationOutcome {
        let result = self.backup.export().await;
        outcome("export_backup", result, |s| {
            (
                None,
                format!(
                    "Exported {} folder(s) and {} prompt(s)",
                    s.folders.len(),
                    s.prompts.len()
                ),
            )
        })
    }

    /// Replay a snapshot into the store as one atomic change.
    pub async fn restore_backup(
        &self,
        snapshot: &BackupSnapshot,
        overwrite: bool,
    ) -> OperationOutcome {
        let result = match self.writable("restore_backup") {
            Ok(()) => self.backup.restore(snapshot, overwrite).await,
            Err(err) => Err(err),
        };
        outcome("restore_backup", result, |s| {
            (
                None,
                format!(
                    "Restored {} folder(s) and {} prompt(s); skipped {} folder(s) and {} prompt(s)",
                    s.folders_created, s.prompts_created, s.folders_skipped, s.prompts_skipped
                ),
            )
        })
    }

    /// Close the store handle.
    pub async fn close(&self) {
        self.store.close().await;
    }

    fn writable(&self, operation: &str) -> AppResult<()> {
        if self.store.is_read_only() {
            return Err(AppError::configuration(format!(
                "'{operation}' needs a writable store, but it was opened read-only"
            )));
        }
        Ok(())
    }
}

/// Fold a service result into an outcome, logging failures by class.
fn outcome<T, F>(operation: &str, result: AppResult<T>, describe: F) -> OperationOutcome
where
    T: Serialize,
    F: FnOnce(&T) -> (Option<String>, String),
{
    match result {
        Ok(value) => {
            let (id, message) = describe(&value);
            OperationOutcome::success(id, message).with_data(&value)
        }
        Err(err) => {
            log_failure(operation, &err);
            OperationOutcome::from_error(&err)
        }
    }
}

fn log_failure(operation: &str, err: &AppError) {
    let source = err.source.as_ref().map(|s| s.to_string());
    match err.kind {
        ErrorKind::Validation
        | ErrorKind::ConfirmationRequired
        | ErrorKind::NotFound
        | ErrorKind::Conflict
        | ErrorKind::Cycle
        | ErrorKind::NotEmpty
        | ErrorKind::InvalidBackup => {
            info!(operation, code = %err.kind, message = %err.message, "Request rejected");
        }
        ErrorKind::StoreBusy => {
            warn!(operation, code = %err.kind, message = %err.message, "Store busy");
        }
        _ => {
            error!(
                operation,
                code = %err.kind,
                message = %err.message,
                source = ?source,
                "Operation failed"
            );
        }
    }
}
