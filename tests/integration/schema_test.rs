//! Integration tests for the schema compatibility guard.

mod helpers;

use sqlx::ConnectOptions;
use sqlx::sqlite::SqliteConnectOptions;

use promptdesk_core::config::AppConfig;
use promptdesk_core::error::ErrorKind;
use promptdesk_core::types::OperationOutcome;
use promptdesk_database::StoreHandle;
use promptdesk_service::PromptEngine;

use helpers::TestApp;

fn config_at(dir: &tempfile::TempDir, expected: i64) -> AppConfig {
    let mut config = AppConfig::default();
    config.database.path = dir
        .path()
        .join("host.sqlite")
        .to_string_lossy()
        .into_owned();
    config.database.expected_schema_version = expected;
    config
}

#[tokio::test]
async fn test_matching_store_opens_for_writing() {
    let app = TestApp::new().await;
    app.engine.close().await;

    let engine = PromptEngine::open(&app.config).await.expect("open");
    assert!(!engine.store().is_read_only());
    engine.close().await;
}

#[tokio::test]
async fn test_version_mismatch_refuses_writable_handle() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (store, report) = StoreHandle::initialize(&config_at(&dir, 2).database)
        .await
        .expect("initialize newer store");
    assert_eq!(report.version, 2);
    store.close().await;

    let config = config_at(&dir, 1);
    let err = PromptEngine::open(&config).await.expect_err("mismatch");
    assert_eq!(err.kind, ErrorKind::SchemaMismatch);

    let outcome = OperationOutcome::from_error(&err);
    let json = serde_json::to_value(&outcome).expect("encode");
    assert_eq!(json["errorCode"], "SCHEMA_MISMATCH");

    let reader = PromptEngine::open_read_only(&config)
        .await
        .expect("read-only path still works");
    assert!(reader.list_folders(None).await.is_success());
    reader.close().await;
}

#[tokio::test]
async fn test_store_without_required_tables_is_a_mismatch() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = config_at(&dir, 1);

    let mut conn = SqliteConnectOptions::new()
        .filename(&config.database.path)
        .create_if_missing(true)
        .connect()
        .await
        .expect("create file");
    sqlx::query("CREATE TABLE folders (id TEXT PRIMARY KEY, name TEXT NOT NULL)")
        .execute(&mut conn)
        .await
        .expect("partial schema");
    sqlx::query("PRAGMA user_version = 1")
        .execute(&mut conn)
        .await
        .expect("stamp version");
    drop(conn);

    let err = PromptEngine::open(&config).await.expect_err("missing prompts table");
    assert_eq!(err.kind, ErrorKind::SchemaMismatch);
}

#[tokio::test]
async fn test_host_owned_extra_tables_are_ignored() {
    let app = TestApp::new().await;
    let mut host = app.host().await;
    sqlx::query("CREATE TABLE host_settings (key TEXT PRIMARY KEY, value TEXT)")
        .execute(&mut host)
        .await
        .expect("host table");
    drop(host);
    app.engine.close().await;

    let engine = PromptEngine::open(&app.config).await.expect("open");
    engine.close().await;
}

#[tokio::test]
async fn test_missing_store_file_is_a_configuration_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = config_at(&dir, 1);

    let err = PromptEngine::open(&config).await.expect_err("no file");
    assert_eq!(err.kind, ErrorKind::Configuration);
    assert!(!std::path::Path::new(&config.database.path).exists());
}
