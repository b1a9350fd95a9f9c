//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::time::Duration;

use serde::de::DeserializeOwned;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{ConnectOptions, SqliteConnection};
use tempfile::TempDir;

use promptdesk_core::config::AppConfig;
use promptdesk_core::error::ErrorKind;
use promptdesk_core::types::{FolderId, OperationOutcome};
use promptdesk_database::StoreHandle;
use promptdesk_entity::folder::Folder;
use promptdesk_entity::prompt::Prompt;
use promptdesk_service::PromptEngine;
use promptdesk_service::requests::{CreateFolderRequest, CreatePromptRequest};

/// Test application context
pub struct TestApp {
    /// Keeps the store directory alive
    pub dir: TempDir,
    /// Application config pointing at the temp store
    pub config: AppConfig,
    /// The engine under test
    pub engine: PromptEngine,
}

impl TestApp {
    /// Create a new test application over a fresh fixture store
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Create a test application after adjusting the default config
    pub async fn with_config(adjust: impl FnOnce(&mut AppConfig)) -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let mut config = AppConfig::default();
        config.database.path = dir
            .path()
            .join("prompts.sqlite")
            .to_string_lossy()
            .into_owned();
        adjust(&mut config);

        let (store, _) = StoreHandle::initialize(&config.database)
            .await
            .expect("Failed to initialize store");
        let engine = PromptEngine::from_handle(store, &config).expect("Failed to build engine");

        Self {
            dir,
            config,
            engine,
        }
    }

    /// Open a separate connection playing the host application
    pub async fn host(&self) -> SqliteConnection {
        SqliteConnectOptions::new()
            .filename(&self.config.database.path)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5))
            .connect()
            .await
            .expect("Failed to open host connection")
    }

    /// Create a folder and return it, failing the test on error
    pub async fn folder(&self, name: &str, parent: Option<&FolderId>) -> Folder {
        let outcome = self
            .engine
            .create_folder(CreateFolderRequest {
                name: name.to_string(),
                parent_id: parent.cloned(),
                ..Default::default()
            })
            .await;
        data_of(outcome)
    }

    /// Create a prompt and return it, failing the test on error
    pub async fn prompt(&self, title: &str, folder: Option<&FolderId>) -> Prompt {
        let outcome = self
            .engine
            .create_prompt(CreatePromptRequest {
                title: title.to_string(),
                content: format!("Body of {title}"),
                folder_id: folder.cloned(),
                ..Default::default()
            })
            .await;
        data_of(outcome)
    }

    /// Number of (folders, prompts) currently in the store
    pub async fn counts(&self) -> (i64, i64) {
        let pool = self.engine.store().pool();
        let folders: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM folders")
            .fetch_one(pool)
            .await
            .expect("count folders");
        let prompts: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM prompts")
            .fetch_one(pool)
            .await
            .expect("count prompts");
        (folders, prompts)
    }

    /// Every folder, for invariant walks
    pub async fn all_folders(&self) -> Vec<Folder> {
        self.engine
            .folders()
            .list_folders(None)
            .await
            .expect("list folders")
    }
}

/// Decode the payload of a successful outcome
pub fn data_of<T: DeserializeOwned>(outcome: OperationOutcome) -> T {
    assert!(outcome.is_success(), "Expected success, got {outcome:?}");
    serde_json::from_value(outcome.data.expect("success carries data")).expect("decode payload")
}

/// Error code of a failed outcome
pub fn code_of(outcome: &OperationOutcome) -> ErrorKind {
    assert!(!outcome.is_success(), "Expected an error, got {outcome:?}");
    outcome.error_code.expect("error carries a code")
}

/// Assert every folder's parent chain reaches the root
pub fn assert_acyclic(folders: &[Folder]) {
    for folder in folders {
        let mut cursor = folder.parent_id.clone();
        let mut steps = 0;
        while let Some(id) = cursor {
            steps += 1;
            assert!(
                steps <= folders.len(),
                "Parent chain of '{}' does not terminate",
                folder.id
            );
            cursor = folders
                .iter()
                .find(|f| f.id == id)
                .expect("parent exists")
                .parent_id
                .clone();
        }
    }
}
