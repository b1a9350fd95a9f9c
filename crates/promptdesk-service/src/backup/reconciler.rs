//! Replays a backup snapshot into the live store.
//!
//! The whole restore runs in one transaction per attempt. Snapshot folder
//! ids are remapped onto live ids through a table that lives only for the
//! duration of one attempt.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use promptdesk_core::error::AppError;
use promptdesk_core::result::AppResult;
use promptdesk_core::types::{FolderId, PromptId};
use promptdesk_database::RetryPolicy;
use promptdesk_database::error::map_sqlx_error;
use promptdesk_database::repositories::{FolderRepository, PromptRepository};
use promptdesk_entity::backup::{BackupSnapshot, RestoreSummary, SnapshotFolder, SnapshotPrompt};
use promptdesk_entity::folder::CreateFolder;
use promptdesk_entity::prompt::CreatePrompt;

use super::ordering;
use crate::folder::cascade;

/// Exports and restores backup snapshots.
#[derive(Debug, Clone)]
pub struct BackupReconciler {
    /// Store connection.
    pool: SqlitePool,
    /// Folder repository.
    folder_repo: Arc<FolderRepository>,
    /// Prompt repository.
    prompt_repo: Arc<PromptRepository>,
    /// Lock-contention retry policy.
    retry: RetryPolicy,
}

/// Result of one committed restore attempt.
#[derive(Debug, Default)]
struct RestoreOutcome {
    summary: RestoreSummary,
    created_folders: Vec<FolderId>,
    created_prompts: Vec<PromptId>,
}

impl BackupReconciler {
    /// Creates a new backup reconciler.
    pub fn new(
        pool: SqlitePool,
        folder_repo: Arc<FolderRepository>,
        prompt_repo: Arc<PromptRepository>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            pool,
            folder_repo,
            prompt_repo,
            retry,
        }
    }

    /// Capture every folder and prompt of the live store.
    pub async fn export(&self) -> AppResult<BackupSnapshot> {
        let folders = self.folder_repo.find_all().await?;
        let prompts = self.prompt_repo.find_all().await?;
        let snapshot = BackupSnapshot::capture(&folders, &prompts);

        info!(
            folders = snapshot.folders.len(),
            prompts = snapshot.prompts.len(),
            "Backup exported"
        );
        Ok(snapshot)
    }

    /// Reproduce a snapshot in the live store.
    ///
    /// Entities matching a live one (folders by name under the resolved
    /// parent, prompts by title) are skipped, or replaced when `overwrite`
    /// is set. Any failure rolls the whole restore back.
    pub async fn restore(
        &self,
        snapshot: &BackupSnapshot,
        overwrite: bool,
    ) -> AppResult<RestoreSummary> {
        ordering::check_snapshot(snapshot)?;
        let folders = ordering::order_by_depth(&snapshot.folders)?;

        let outcome = self
            .retry
            .run("restore_backup", || {
                self.restore_once(&folders, &snapshot.prompts, overwrite)
            })
            .await?;

        for id in &outcome.created_folders {
            let found = self.folder_repo.find_by_id(id).await?;
            if found.is_none() {
                return Err(AppError::verification_failed(format!(
                    "Restored folder '{id}' is not visible after commit"
                )));
            }
        }
        for id in &outcome.created_prompts {
            let found = self.prompt_repo.find_by_id(id).await?;
            if found.is_none() {
                return Err(AppError::verification_failed(format!(
                    "Restored prompt '{id}' is not visible after commit"
                )));
            }
        }

        let summary = outcome.summary;
        info!(
            overwrite,
            folders_created = summary.folders_created,
            folders_skipped = summary.folders_skipped,
            folders_replaced = summary.folders_replaced,
            prompts_created = summary.prompts_created,
            prompts_skipped = summary.prompts_skipped,
            prompts_replaced = summary.prompts_replaced,
            "Backup restored"
        );
        Ok(summary)
    }

    async fn restore_once(
        &self,
        folders: &[&SnapshotFolder],
        prompts: &[SnapshotPrompt],
        overwrite: bool,
    ) -> AppResult<RestoreOutcome> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("Failed to begin restore", e))?;

        let mut outcome = RestoreOutcome::default();
        let mut id_map: HashMap<&FolderId, FolderId> = HashMap::with_capacity(folders.len());

        for folder in folders {
            let live_id = self
                .restore_folder(&mut tx, folder, &id_map, overwrite, &mut outcome)
                .await?;
            id_map.insert(&folder.id, live_id);
        }

        for prompt in prompts {
            let folder_id = match &prompt.folder_id {
                None => None,
                Some(old) => Some(id_map.get(old).cloned().ok_or_else(|| {
                    AppError::invalid_backup(format!(
                        "Snapshot prompt '{}' references folder '{old}' which is not in the snapshot",
                        prompt.id
                    ))
                })?),
            };
            self.restore_prompt(&mut tx, prompt, folder_id, overwrite, &mut outcome)
                .await?;
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("Failed to commit restore", e))?;
        Ok(outcome)
    }

    /// Materialize one snapshot folder and return the live id it maps to.
    async fn restore_folder(
        &self,
        conn: &mut SqliteConnection,
        folder: &SnapshotFolder,
        id_map: &HashMap<&FolderId, FolderId>,
        overwrite: bool,
        outcome: &mut RestoreOutcome,
    ) -> AppResult<FolderId> {
        let parent_id = match &folder.parent_id {
            None => None,
            Some(old) => Some(id_map.get(old).cloned().ok_or_else(|| {
                AppError::invalid_backup(format!(
                    "Snapshot folder '{}' was ordered before its parent '{old}'",
                    folder.id
                ))
            })?),
        };

        let existing = self
            .folder_repo
            .find_sibling_tx(&mut *conn, &folder.name, parent_id.as_ref())
            .await?;

        if let Some(live) = existing {
            let created_here = outcome.created_folders.contains(&live.id);
            if !overwrite || created_here {
                debug!(
                    snapshot_id = %folder.id,
                    live_id = %live.id,
                    "Folder already present, merging"
                );
                outcome.summary.folders_skipped += 1;
                return Ok(live.id);
            }

            let removed = cascade::delete_subtree_tx(
                &self.folder_repo,
                &self.prompt_repo,
                &mut *conn,
                &live.id,
            )
            .await?;
            debug!(
                live_id = %live.id,
                folders = removed.folders_deleted,
                prompts = removed.prompts_deleted,
                "Replacing existing folder subtree"
            );
            outcome.summary.folders_replaced += 1;
        }

        let now = Utc::now();
        let record = CreateFolder {
            id: FolderId::new(),
            name: folder.name.clone(),
            parent_id,
            created_at: folder.created_at.unwrap_or(now),
            updated_at: folder.updated_at.unwrap_or(now),
        };
        let created = self.folder_repo.insert_tx(&mut *conn, &record).await?;
        outcome.summary.folders_created += 1;
        outcome.created_folders.push(created.id.clone());
        Ok(created.id)
    }

    async fn restore_prompt(
        &self,
        conn: &mut SqliteConnection,
        prompt: &SnapshotPrompt,
        folder_id: Option<FolderId>,
        overwrite: bool,
        outcome: &mut RestoreOutcome,
    ) -> AppResult<()> {
        let existing = self
            .prompt_repo
            .find_by_title_tx(&mut *conn, &prompt.title)
            .await?;

        if let Some(live) = existing {
            let created_here = outcome.created_prompts.contains(&live.id);
            if !overwrite || created_here {
                debug!(
                    snapshot_id = %prompt.id,
                    live_id = %live.id,
                    "Prompt already present, skipping"
                );
                outcome.summary.prompts_skipped += 1;
                return Ok(());
            }

            self.prompt_repo.delete_tx(&mut *conn, &live.id).await?;
            outcome.summary.prompts_replaced += 1;
        }

        let now = Utc::now();
        let record = CreatePrompt {
            id: PromptId::new(),
            title: prompt.title.clone(),
            content: prompt.content.clone(),
            folder_id,
            emoji: prompt.emoji.clone(),
            color: prompt.color,
            url: prompt.url.clone(),
            created_at: prompt.created_at.unwrap_or(now),
            updated_at: prompt.updated_at.unwrap_or(now),
        };
        let created = self.prompt_repo.insert_tx(&mut *conn, &record).await?;
        outcome.summary.prompts_created += 1;
        outcome.created_prompts.push(created.id);
        Ok(())
    }
}
