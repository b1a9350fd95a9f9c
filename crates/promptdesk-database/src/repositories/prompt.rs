//! Prompt repository implementation.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};

use promptdesk_core::result::AppResult;
use promptdesk_core::types::{FolderId, PromptId};
use promptdesk_entity::prompt::{CreatePrompt, Prompt};

use crate::error::{map_delete_error, map_sqlx_error};

/// Repository for prompt CRUD.
#[derive(Debug, Clone)]
pub struct PromptRepository {
    pool: SqlitePool,
}

impl PromptRepository {
    /// Create a new prompt repository.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Find a prompt by ID.
    pub async fn find_by_id(&self, id: &PromptId) -> AppResult<Option<Prompt>> {
        sqlx::query_as::<_, Prompt>("SELECT * FROM prompts WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("Failed to find prompt", e))
    }

    /// Same as [`Self::find_by_id`], inside an open transaction.
    pub async fn find_by_id_tx(
        &self,
        conn: &mut SqliteConnection,
        id: &PromptId,
    ) -> AppResult<Option<Prompt>> {
        sqlx::query_as::<_, Prompt>("SELECT * FROM prompts WHERE id = ?1")
            .bind(id)
            .fetch_optional(conn)
            .await
            .map_err(|e| map_sqlx_error("Failed to find prompt", e))
    }

    /// List every prompt, ordered by title.
    pub async fn find_all(&self) -> AppResult<Vec<Prompt>> {
        sqlx::query_as::<_, Prompt>("SELECT * FROM prompts ORDER BY title ASC, id ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("Failed to list prompts", e))
    }

    /// List the prompts in a folder, or the unfiled prompts for `None`.
    pub async fn find_by_folder(&self, folder_id: Option<&FolderId>) -> AppResult<Vec<Prompt>> {
        sqlx::query_as::<_, Prompt>(
            "SELECT * FROM prompts WHERE COALESCE(folder_id, '') = COALESCE(?1, '') \
             ORDER BY title ASC, id ASC",
        )
        .bind(folder_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("Failed to list prompts in folder", e))
    }

    /// Count prompts directly inside a folder.
    pub async fn count_in_folder(&self, folder_id: &FolderId) -> AppResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM prompts WHERE folder_id = ?1")
            .bind(folder_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("Failed to count prompts", e))?;
        Ok(count as u64)
    }

    /// Find the oldest prompt with exactly this title, inside an open
    /// transaction.
    pub async fn find_by_title_tx(
        &self,
        conn: &mut SqliteConnection,
        title: &str,
    ) -> AppResult<Option<Prompt>> {
        sqlx::query_as::<_, Prompt>(
            "SELECT * FROM prompts WHERE title = ?1 ORDER BY created_at ASC, id ASC LIMIT 1",
        )
        .bind(title)
        .fetch_optional(conn)
        .await
        .map_err(|e| map_sqlx_error("Failed to find prompt by title", e))
    }

    /// Insert a prompt row.
    pub async fn insert_tx(
        &self,
        conn: &mut SqliteConnection,
        data: &CreatePrompt,
    ) -> AppResult<Prompt> {
        sqlx::query_as::<_, Prompt>(
            "INSERT INTO prompts \
             (id, title, content, folder_id, emoji, color, url, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9) RETURNING *",
        )
        .bind(&data.id)
        .bind(&data.title)
        .bind(&data.content)
        .bind(data.folder_id.as_ref())
        .bind(data.emoji.as_deref())
        .bind(data.color)
        .bind(data.url.as_deref())
        .bind(data.created_at)
        .bind(data.updated_at)
        .fetch_one(conn)
        .await
        .map_err(|e| map_sqlx_error("Failed to insert prompt", e))
    }

    /// Write every mutable field of `prompt`.
    ///
    /// `prompt` must have been read inside the same transaction, otherwise
    /// this overwrites whatever another writer committed in between.
    /// Returns `None` if the row vanished.
    pub async fn update_tx(
        &self,
        conn: &mut SqliteConnection,
        prompt: &Prompt,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Prompt>> {
        sqlx::query_as::<_, Prompt>(
            "UPDATE prompts SET title = ?2, content = ?3, folder_id = ?4, emoji = ?5, \
             color = ?6, url = ?7, updated_at = ?8 WHERE id = ?1 RETURNING *",
        )
        .bind(&prompt.id)
        .bind(&prompt.title)
        .bind(&prompt.content)
        .bind(prompt.folder_id.as_ref())
        .bind(prompt.emoji.as_deref())
        .bind(prompt.color)
        .bind(prompt.url.as_deref())
        .bind(now)
        .fetch_optional(conn)
        .await
        .map_err(|e| map_sqlx_error("Failed to update prompt", e))
    }

    /// Change only the folder reference of a prompt.
    pub async fn move_tx(
        &self,
        conn: &mut SqliteConnection,
        id: &PromptId,
        folder_id: Option<&FolderId>,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Prompt>> {
        sqlx::query_as::<_, Prompt>(
            "UPDATE prompts SET folder_id = ?2, updated_at = ?3 WHERE id = ?1 RETURNING *",
        )
        .bind(id)
        .bind(folder_id)
        .bind(now)
        .fetch_optional(conn)
        .await
        .map_err(|e| map_sqlx_error("Failed to move prompt", e))
    }

    /// Delete a single prompt row. Returns whether a row was removed.
    pub async fn delete_tx(&self, conn: &mut SqliteConnection, id: &PromptId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM prompts WHERE id = ?1")
            .bind(id)
            .execute(conn)
            .await
            .map_err(|e| map_delete_error("Failed to delete prompt", e))?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete every prompt directly inside a folder. Returns the count.
    pub async fn delete_in_folder_tx(
        &self,
        conn: &mut SqliteConnection,
        folder_id: &FolderId,
    ) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM prompts WHERE folder_id = ?1")
            .bind(folder_id)
            .execute(conn)
            .await
            .map_err(|e| map_delete_error("Failed to delete prompts in folder", e))?;
        Ok(result.rows_affected())
    }
}
