//! Schema compatibility guard and fixture schema.
//!
//! The host application owns the store's schema. Its structural version
//! lives in `PRAGMA user_version`; a writable handle is only handed out
//! when that marker equals the version this engine understands and the
//! tables it writes to are present. Extra host tables are ignored.

use std::collections::BTreeSet;

use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{error, info};

use promptdesk_core::error::AppError;
use promptdesk_core::result::AppResult;

use crate::error::map_sqlx_error;

/// Tables the write path touches.
pub const REQUIRED_TABLES: [&str; 2] = ["folders", "prompts"];

/// What the guard observed on a store that passed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaReport {
    /// Value of the structural version marker.
    pub version: i64,
    /// All user tables in the store.
    pub tables: Vec<String>,
}

/// Read the structural version marker.
pub async fn read_version(pool: &SqlitePool) -> AppResult<i64> {
    sqlx::query_scalar::<_, i64>("PRAGMA user_version")
        .fetch_one(pool)
        .await
        .map_err(|e| map_sqlx_error("Failed to read schema version", e))
}

/// List the user tables present in the store.
pub async fn list_tables(pool: &SqlitePool) -> AppResult<BTreeSet<String>> {
    let names = sqlx::query_scalar::<_, String>(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
    )
    .fetch_all(pool)
    .await
    .map_err(|e| map_sqlx_error("Failed to list tables", e))?;

    Ok(names.into_iter().collect())
}

/// Refuse the store unless its version marker is `expected` and every
/// required table exists.
pub async fn guard(pool: &SqlitePool, expected: i64) -> AppResult<SchemaReport> {
    let tables = list_tables(pool).await?;
    let missing: Vec<&str> = REQUIRED_TABLES
        .into_iter()
        .filter(|table| !tables.contains(*table))
        .collect();

    if !missing.is_empty() {
        error!(missing = ?missing, "Store is missing required tables");
        return Err(AppError::schema_mismatch(format!(
            "Store is missing required tables: {}",
            missing.join(", ")
        )));
    }

    let version = read_version(pool).await?;
    if version != expected {
        error!(
            found = version,
            expected, "Store schema version is not supported"
        );
        return Err(AppError::schema_mismatch(format!(
            "Store schema version {version} is not supported (expected {expected})"
        )));
    }

    info!(version, "Store schema accepted");
    Ok(SchemaReport {
        version,
        tables: tables.into_iter().collect(),
    })
}

/// DDL of the tables the engine expects, with the constraints the write
/// path relies on as a backstop.
const FIXTURE_DDL: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS folders ( \
        id TEXT PRIMARY KEY NOT NULL, \
        name TEXT NOT NULL, \
        parent_id TEXT REFERENCES folders(id), \
        created_at TEXT NOT NULL, \
        updated_at TEXT NOT NULL \
     )",
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_folders_sibling_name \
     ON folders(name, COALESCE(parent_id, ''))",
    "CREATE INDEX IF NOT EXISTS idx_folders_parent ON folders(parent_id)",
    "CREATE TABLE IF NOT EXISTS prompts ( \
        id TEXT PRIMARY KEY NOT NULL, \
        title TEXT NOT NULL, \
        content TEXT NOT NULL DEFAULT '', \
        folder_id TEXT REFERENCES folders(id), \
        emoji TEXT, \
        color TEXT, \
        url TEXT, \
        created_at TEXT NOT NULL, \
        updated_at TEXT NOT NULL \
     )",
    "CREATE INDEX IF NOT EXISTS idx_prompts_folder ON prompts(folder_id)",
    "CREATE INDEX IF NOT EXISTS idx_prompts_title ON prompts(title)",
];

/// Create the expected tables and stamp the version marker.
///
/// Meant for development stores and tests; a host-owned store is never
/// migrated by the engine.
pub async fn install(pool: &SqlitePool, version: i64) -> AppResult<()> {
    let mut tx = pool
        .begin()
        .await
        .map_err(|e| map_sqlx_error("Failed to begin schema install", e))?;

    for statement in FIXTURE_DDL {
        sqlx::query(*statement)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("Failed to install schema", e))?;
    }

    // PRAGMA arguments cannot be bound.
    sqlx::query(&format!("PRAGMA user_version = {version}"))
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("Failed to stamp schema version", e))?;

    tx.commit()
        .await
        .map_err(|e| map_sqlx_error("Failed to commit schema install", e))?;

    info!(version, "Fixture schema installed");
    Ok(())
}
