//! Depth-first removal of a folder subtree.

use serde::Serialize;
use sqlx::SqliteConnection;

use promptdesk_core::error::AppError;
use promptdesk_core::result::AppResult;
use promptdesk_core::types::FolderId;
use promptdesk_database::repositories::{FolderRepository, PromptRepository};

/// What a folder deletion removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderDeletion {
    /// Number of folders removed, the target included.
    pub folders_deleted: usize,
    /// Number of prompts removed.
    pub prompts_deleted: u64,
    /// Every removed folder id, used for read-back.
    #[serde(skip)]
    pub removed_folders: Vec<FolderId>,
}

/// Delete `root`, every descendant folder and every prompt filed in any of
/// them, on the given transaction.
///
/// Prompts go first, then folders from the deepest up, so no statement
/// ever leaves a dangling reference behind.
pub async fn delete_subtree_tx(
    folder_repo: &FolderRepository,
    prompt_repo: &PromptRepository,
    conn: &mut SqliteConnection,
    root: &FolderId,
) -> AppResult<FolderDeletion> {
    let ids = folder_repo.subtree_ids_tx(&mut *conn, root).await?;

    let mut prompts_deleted = 0;
    for id in &ids {
        prompts_deleted += prompt_repo.delete_in_folder_tx(&mut *conn, id).await?;
    }

    for id in ids.iter().rev() {
        if !folder_repo.delete_tx(&mut *conn, id).await? {
            return Err(AppError::not_found(format!(
                "Folder '{id}' disappeared during deletion"
            )));
        }
    }

    Ok(FolderDeletion {
        folders_deleted: ids.len(),
        prompts_deleted,
        removed_folders: ids,
    })
}
