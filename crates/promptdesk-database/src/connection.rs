//! Handle on the shared SQLite store.
//!
//! The engine keeps exactly one write-capable connection for its lifetime.
//! The store runs in WAL mode so the host application can keep reading
//! while this process writes, and vice versa.

use std::path::{Path, PathBuf};
use std::time::Duration;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use tracing::{info, warn};

use promptdesk_core::config::DatabaseConfig;
use promptdesk_core::error::{AppError, ErrorKind};
use promptdesk_core::result::AppResult;

use crate::schema::{self, SchemaReport};

/// Owned handle on the store, passed to whatever needs database access.
#[derive(Debug, Clone)]
pub struct StoreHandle {
    /// Single-connection pool.
    pool: SqlitePool,
    /// Location of the store file.
    path: PathBuf,
    /// Whether the connection was opened read-only.
    read_only: bool,
}

impl StoreHandle {
    /// Open the store for writing.
    ///
    /// The schema compatibility guard runs before the handle is returned;
    /// on mismatch the connection is closed and `SCHEMA_MISMATCH` is
    /// reported.
    pub async fn open(config: &DatabaseConfig) -> AppResult<Self> {
        let path = PathBuf::from(&config.path);
        if !path.exists() {
            return Err(AppError::configuration(format!(
                "Store file '{}' does not exist",
                path.display()
            )));
        }

        let handle = Self::connect(config, path, false, false).await?;
        if let Err(err) = schema::guard(&handle.pool, config.expected_schema_version).await {
            handle.close().await;
            return Err(err);
        }
        Ok(handle)
    }

    /// Open the store without write access and without the schema guard.
    pub async fn open_read_only(config: &DatabaseConfig) -> AppResult<Self> {
        let path = PathBuf::from(&config.path);
        if !path.exists() {
            return Err(AppError::configuration(format!(
                "Store file '{}' does not exist",
                path.display()
            )));
        }
        Self::connect(config, path, true, false).await
    }

    /// Create a development store with the fixture schema, or reuse an
    /// existing file, then open it for writing.
    pub async fn initialize(config: &DatabaseConfig) -> AppResult<(Self, SchemaReport)> {
        let path = PathBuf::from(&config.path);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let handle = Self::connect(config, path, false, true).await?;
        let tables = schema::list_tables(&handle.pool).await?;
        if tables.is_empty() {
            schema::install(&handle.pool, config.expected_schema_version).await?;
        } else {
            warn!(path = %handle.path.display(), "Store already has tables, leaving schema untouched");
        }

        let report = match schema::guard(&handle.pool, config.expected_schema_version).await {
            Ok(report) => report,
            Err(err) => {
                handle.close().await;
                return Err(err);
            }
        };
        Ok((handle, report))
    }

    async fn connect(
        config: &DatabaseConfig,
        path: PathBuf,
        read_only: bool,
        create: bool,
    ) -> AppResult<Self> {
        info!(
            path = %path.display(),
            read_only,
            busy_timeout_ms = config.busy_timeout_ms,
            "Opening store"
        );

        let mut options = SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(create)
            .read_only(read_only)
            .foreign_keys(true)
            .busy_timeout(Duration::from_millis(config.busy_timeout_ms));
        if !read_only {
            options = options
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal);
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_seconds))
            .connect_with(options)
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Database,
                    format!("Failed to open store '{}': {e}", path.display()),
                    e,
                )
            })?;

        info!(path = %path.display(), "Store opened");
        Ok(Self {
            pool,
            path,
            read_only,
        })
    }

    /// Return a reference to the underlying sqlx pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Location of the store file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether this handle refuses writes.
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Close the connection.
    pub async fn close(&self) {
        self.pool.close().await;
        info!(path = %self.path.display(), "Store closed");
    }
}
