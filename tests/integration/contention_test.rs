//! Integration tests for writes racing the host application.
//!
//! A second raw connection plays the host: it takes the store's write lock
//! with `BEGIN IMMEDIATE` and holds it while the engine tries to write.

mod helpers;

use std::time::Duration;

use sqlx::SqliteConnection;

use promptdesk_core::config::AppConfig;
use promptdesk_core::error::ErrorKind;
use promptdesk_core::types::FolderId;
use promptdesk_entity::folder::Folder;
use promptdesk_entity::prompt::Prompt;
use promptdesk_service::requests::{DeleteFolderRequest, UpdateFolderRequest, UpdatePromptRequest};

use helpers::{TestApp, assert_acyclic, code_of, data_of};

fn contended(config: &mut AppConfig) {
    config.database.busy_timeout_ms = 10;
    config.retry.max_attempts = 5;
    config.retry.base_delay_ms = 30;
    config.retry.multiplier = 2;
    config.retry.max_delay_ms = 200;
}

async fn lock(host: &mut SqliteConnection) {
    sqlx::query("BEGIN IMMEDIATE")
        .execute(&mut *host)
        .await
        .expect("host takes the write lock");
}

/// Take the write lock and reparent `folder` under `parent` without
/// committing yet.
async fn host_reparents(host: &mut SqliteConnection, folder: &FolderId, parent: &FolderId) {
    lock(host).await;
    sqlx::query("UPDATE folders SET parent_id = ?1 WHERE id = ?2")
        .bind(parent.as_str())
        .bind(folder.as_str())
        .execute(&mut *host)
        .await
        .expect("host reparents");
}

/// Hold the host lock for `hold`, then release it with `statement`.
fn release_after(
    mut host: SqliteConnection,
    hold: Duration,
    statement: &'static str,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        tokio::time::sleep(hold).await;
        sqlx::query(statement)
            .execute(&mut host)
            .await
            .expect("host releases the lock");
    })
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_write_succeeds_once_host_releases_lock() {
    let app = TestApp::with_config(contended).await;
    let prompt = app.prompt("Shared", None).await;

    let mut host = app.host().await;
    lock(&mut host).await;
    let host_task = release_after(host, Duration::from_millis(60), "COMMIT");

    let outcome = app
        .engine
        .update_prompt(UpdatePromptRequest {
            title: Some("Edited while host was busy".into()),
            ..UpdatePromptRequest::empty(prompt.id.clone())
        })
        .await;
    host_task.await.expect("host task");

    let updated: Prompt = data_of(outcome);
    assert_eq!(updated.title, "Edited while host was busy");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_partial_update_keeps_host_edit_to_other_fields() {
    let app = TestApp::with_config(contended).await;
    let prompt = app.prompt("Shared", None).await;

    let mut host = app.host().await;
    lock(&mut host).await;
    sqlx::query("UPDATE prompts SET content = 'Edited by host' WHERE id = ?1")
        .bind(prompt.id.as_str())
        .execute(&mut host)
        .await
        .expect("host edits content");
    let host_task = release_after(host, Duration::from_millis(60), "COMMIT");

    let outcome = app
        .engine
        .update_prompt(UpdatePromptRequest {
            title: Some("Renamed by engine".into()),
            ..UpdatePromptRequest::empty(prompt.id.clone())
        })
        .await;
    host_task.await.expect("host task");

    let updated: Prompt = data_of(outcome);
    assert_eq!(updated.title, "Renamed by engine");
    assert_eq!(updated.content, "Edited by host");

    let stored = app.engine.prompts().get_prompt(&prompt.id).await.expect("stored");
    assert_eq!(stored.title, "Renamed by engine");
    assert_eq!(stored.content, "Edited by host");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_rename_keeps_concurrent_host_reparent() {
    let app = TestApp::with_config(contended).await;
    let a = app.folder("A", None).await;
    let b = app.folder("B", None).await;

    let mut host = app.host().await;
    host_reparents(&mut host, &b.id, &a.id).await;
    let host_task = release_after(host, Duration::from_millis(60), "COMMIT");

    let outcome = app
        .engine
        .update_folder(UpdateFolderRequest {
            folder_id: b.id.clone(),
            name: Some("Renamed".into()),
            parent_id: None,
        })
        .await;
    host_task.await.expect("host task");

    let renamed: Folder = data_of(outcome);
    assert_eq!(renamed.name, "Renamed");
    assert_eq!(renamed.parent_id, Some(a.id.clone()));

    let stored = app.engine.folders().get_folder(&b.id).await.expect("stored");
    assert_eq!(stored.parent_id, Some(a.id));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_move_rechecks_cycle_against_host_reparent() {
    let app = TestApp::with_config(contended).await;
    let a = app.folder("A", None).await;
    let b = app.folder("B", None).await;

    let mut host = app.host().await;
    host_reparents(&mut host, &b.id, &a.id).await;
    let host_task = release_after(host, Duration::from_millis(60), "COMMIT");

    let outcome = app
        .engine
        .update_folder(UpdateFolderRequest {
            folder_id: a.id.clone(),
            name: None,
            parent_id: Some(Some(b.id.clone())),
        })
        .await;
    host_task.await.expect("host task");

    assert_eq!(code_of(&outcome), ErrorKind::Cycle);
    let folders = app.all_folders().await;
    assert_acyclic(&folders);
    let stored = app.engine.folders().get_folder(&a.id).await.expect("stored");
    assert!(stored.is_root());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_exhausted_retries_report_busy_and_change_nothing() {
    let app = TestApp::with_config(|c| {
        c.database.busy_timeout_ms = 5;
        c.retry.max_attempts = 3;
        c.retry.base_delay_ms = 5;
        c.retry.max_delay_ms = 10;
    })
    .await;
    let prompt = app.prompt("Locked", None).await;

    let mut host = app.host().await;
    lock(&mut host).await;

    let outcome = app
        .engine
        .update_prompt(UpdatePromptRequest {
            title: Some("Never written".into()),
            ..UpdatePromptRequest::empty(prompt.id.clone())
        })
        .await;

    sqlx::query("ROLLBACK")
        .execute(&mut host)
        .await
        .expect("host releases the lock");

    assert_eq!(code_of(&outcome), ErrorKind::StoreBusy);
    assert!(outcome.retryable);
    assert!(outcome.message.contains("3 attempts"), "{}", outcome.message);

    let stored = app.engine.prompts().get_prompt(&prompt.id).await.expect("stored");
    assert!(stored.same_fields(&prompt));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_recursive_delete_under_contention_is_all_or_nothing() {
    let app = TestApp::with_config(contended).await;
    let root = app.folder("Root", None).await;
    let child = app.folder("Child", Some(&root.id)).await;
    app.prompt("Deep", Some(&child.id)).await;

    let mut host = app.host().await;
    lock(&mut host).await;
    let host_task = release_after(host, Duration::from_millis(50), "ROLLBACK");

    let outcome = app
        .engine
        .delete_folder(DeleteFolderRequest {
            folder_id: root.id.clone(),
            recursive: true,
            confirm: true,
        })
        .await;
    host_task.await.expect("host task");

    assert!(outcome.is_success(), "{outcome:?}");
    assert_eq!(app.counts().await, (0, 0));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_updates_never_mix_rows() {
    let app = TestApp::with_config(contended).await;
    let prompt = app.prompt("Contended", None).await;

    let mut host = app.host().await;
    lock(&mut host).await;
    let host_task = release_after(host, Duration::from_millis(40), "COMMIT");

    let first = UpdatePromptRequest {
        title: Some("Version A".into()),
        content: Some("Body A".into()),
        ..UpdatePromptRequest::empty(prompt.id.clone())
    };
    let second = UpdatePromptRequest {
        title: Some("Version B".into()),
        content: Some("Body B".into()),
        ..UpdatePromptRequest::empty(prompt.id.clone())
    };

    let (a, b) = tokio::join!(
        app.engine.update_prompt(first),
        app.engine.update_prompt(second)
    );
    host_task.await.expect("host task");

    for outcome in [&a, &b] {
        if !outcome.is_success() {
            let code = code_of(outcome);
            assert!(
                matches!(code, ErrorKind::StoreBusy | ErrorKind::VerificationFailed),
                "Unexpected failure {outcome:?}"
            );
        }
    }
    assert!(a.is_success() || b.is_success(), "{a:?} / {b:?}");

    let stored = app.engine.prompts().get_prompt(&prompt.id).await.expect("stored");
    let whole_a = stored.title == "Version A" && stored.content == "Body A";
    let whole_b = stored.title == "Version B" && stored.content == "Body B";
    assert!(whole_a || whole_b, "Mixed row: {stored:?}");
    assert_eq!(app.counts().await, (0, 1));
}
