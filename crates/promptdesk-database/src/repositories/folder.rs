//! Folder repository implementation.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqliteExecutor, SqlitePool};

use promptdesk_core::result::AppResult;
use promptdesk_core::types::FolderId;
use promptdesk_entity::folder::{CreateFolder, Folder};

use crate::error::{map_delete_error, map_sqlx_error};

/// Repository for folder CRUD and tree queries.
#[derive(Debug, Clone)]
pub struct FolderRepository {
    pool: SqlitePool,
}

impl FolderRepository {
    /// Create a new folder repository.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Find a folder by ID.
    pub async fn find_by_id(&self, id: &FolderId) -> AppResult<Option<Folder>> {
        fetch_by_id(&self.pool, id).await
    }

    /// List every folder, ordered by name.
    pub async fn find_all(&self) -> AppResult<Vec<Folder>> {
        sqlx::query_as::<_, Folder>("SELECT * FROM folders ORDER BY name ASC, id ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("Failed to list folders", e))
    }

    /// List direct children of a folder, or the root folders for `None`.
    pub async fn find_children(&self, parent_id: Option<&FolderId>) -> AppResult<Vec<Folder>> {
        sqlx::query_as::<_, Folder>(
            "SELECT * FROM folders WHERE COALESCE(parent_id, '') = COALESCE(?1, '') \
             ORDER BY name ASC",
        )
        .bind(parent_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("Failed to list child folders", e))
    }

    /// Same as [`Self::find_by_id`], inside an open transaction.
    pub async fn find_by_id_tx(
        &self,
        conn: &mut SqliteConnection,
        id: &FolderId,
    ) -> AppResult<Option<Folder>> {
        fetch_by_id(conn, id).await
    }

    /// Find the folder called `name` directly under `parent_id`, inside an
    /// open transaction.
    pub async fn find_sibling_tx(
        &self,
        conn: &mut SqliteConnection,
        name: &str,
        parent_id: Option<&FolderId>,
    ) -> AppResult<Option<Folder>> {
        sqlx::query_as::<_, Folder>(
            "SELECT * FROM folders WHERE name = ?1 AND COALESCE(parent_id, '') = COALESCE(?2, '') \
             LIMIT 1",
        )
        .bind(name)
        .bind(parent_id)
        .fetch_optional(conn)
        .await
        .map_err(|e| map_sqlx_error("Failed to find sibling folder", e))
    }

    /// Look up only the parent reference of a folder.
    ///
    /// Returns `None` when the folder does not exist and `Some(None)` for a
    /// root folder.
    pub async fn find_parent_id_tx(
        &self,
        conn: &mut SqliteConnection,
        id: &FolderId,
    ) -> AppResult<Option<Option<FolderId>>> {
        sqlx::query_scalar::<_, Option<FolderId>>("SELECT parent_id FROM folders WHERE id = ?1")
            .bind(id)
            .fetch_optional(conn)
            .await
            .map_err(|e| map_sqlx_error("Failed to read folder parent", e))
    }

    /// Count child folders.
    pub async fn count_children(&self, id: &FolderId) -> AppResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM folders WHERE parent_id = ?1")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("Failed to count child folders", e))?;
        Ok(count as u64)
    }

    /// Insert a folder row.
    pub async fn insert_tx(
        &self,
        conn: &mut SqliteConnection,
        data: &CreateFolder,
    ) -> AppResult<Folder> {
        sqlx::query_as::<_, Folder>(
            "INSERT INTO folders (id, name, parent_id, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5) RETURNING *",
        )
        .bind(&data.id)
        .bind(&data.name)
        .bind(data.parent_id.as_ref())
        .bind(data.created_at)
        .bind(data.updated_at)
        .fetch_one(conn)
        .await
        .map_err(|e| map_sqlx_error("Failed to insert folder", e))
    }

    /// Write the name and parent of `folder`, which must have been read
    /// inside the same transaction.
    ///
    /// Returns `None` if the row vanished.
    pub async fn update_tx(
        &self,
        conn: &mut SqliteConnection,
        folder: &Folder,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Folder>> {
        sqlx::query_as::<_, Folder>(
            "UPDATE folders SET name = ?2, parent_id = ?3, updated_at = ?4 \
             WHERE id = ?1 RETURNING *",
        )
        .bind(&folder.id)
        .bind(&folder.name)
        .bind(folder.parent_id.as_ref())
        .bind(now)
        .fetch_optional(conn)
        .await
        .map_err(|e| map_sqlx_error("Failed to update folder", e))
    }

    /// Delete a single folder row. Returns whether a row was removed.
    pub async fn delete_tx(&self, conn: &mut SqliteConnection, id: &FolderId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM folders WHERE id = ?1")
            .bind(id)
            .execute(conn)
            .await
            .map_err(|e| map_delete_error("Failed to delete folder", e))?;
        Ok(result.rows_affected() > 0)
    }

    /// Collect `root` and all of its descendants, parents before children.
    ///
    /// The walk is iterative and tracks visited ids, so a corrupted
    /// hierarchy cannot make it loop.
    pub async fn subtree_ids_tx(
        &self,
        conn: &mut SqliteConnection,
        root: &FolderId,
    ) -> AppResult<Vec<FolderId>> {
        let mut order = Vec::new();
        let mut visited = BTreeSet::new();
        let mut stack = vec![root.clone()];

        while let Some(id) = stack.pop() {
            if !visited.insert(id.clone()) {
                continue;
            }
            let children: Vec<FolderId> = sqlx::query_scalar(
                "SELECT id FROM folders WHERE parent_id = ?1 ORDER BY name DESC",
            )
            .bind(&id)
            .fetch_all(&mut *conn)
            .await
            .map_err(|e| map_sqlx_error("Failed to walk folder subtree", e))?;

            order.push(id);
            stack.extend(children);
        }

        Ok(order)
    }
}

async fn fetch_by_id<'e, E>(executor: E, id: &'e FolderId) -> AppResult<Option<Folder>>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, Folder>("SELECT * FROM folders WHERE id = ?1")
        .bind(id)
        .fetch_optional(executor)
        .await
        .map_err(|e| map_sqlx_error("Failed to find folder", e))
}
