//! Integration tests for backup export and restore.

mod helpers;

use promptdesk_core::error::ErrorKind;
use promptdesk_core::types::FolderId;
use promptdesk_entity::backup::{BackupSnapshot, RestoreSummary, SnapshotPrompt};
use promptdesk_service::requests::UpdatePromptRequest;

use helpers::{TestApp, code_of, data_of};

/// A store with a small tree: Work/Drafts with prompts at each level.
async fn populated() -> TestApp {
    let app = TestApp::new().await;
    let work = app.folder("Work", None).await;
    let drafts = app.folder("Drafts", Some(&work.id)).await;
    app.folder("Personal", None).await;
    app.prompt("Standup", Some(&work.id)).await;
    app.prompt("Release notes", Some(&drafts.id)).await;
    app.prompt("Loose idea", None).await;
    app
}

#[tokio::test]
async fn test_export_then_restore_into_empty_store() {
    let source = populated().await;
    let snapshot: BackupSnapshot = data_of(source.engine.export_backup().await);
    assert_eq!(snapshot.folders.len(), 3);
    assert_eq!(snapshot.prompts.len(), 3);

    let target = TestApp::new().await;
    let summary: RestoreSummary = data_of(target.engine.restore_backup(&snapshot, false).await);
    assert_eq!(summary.folders_created, 3);
    assert_eq!(summary.prompts_created, 3);
    assert_eq!(target.counts().await, (3, 3));

    let folders = target.all_folders().await;
    let work = folders.iter().find(|f| f.name == "Work").expect("work");
    let drafts = folders.iter().find(|f| f.name == "Drafts").expect("drafts");
    assert_eq!(drafts.parent_id.as_ref(), Some(&work.id));

    let in_drafts = target
        .engine
        .prompts()
        .list_prompts(Some(Some(&drafts.id)))
        .await
        .expect("list");
    assert_eq!(in_drafts.len(), 1);
    assert_eq!(in_drafts[0].title, "Release notes");
}

#[tokio::test]
async fn test_restoring_twice_without_overwrite_is_idempotent() {
    let source = populated().await;
    let snapshot = source.engine.snapshot().await.expect("snapshot");

    let target = TestApp::new().await;
    data_of::<RestoreSummary>(target.engine.restore_backup(&snapshot, false).await);
    let after_first = target.counts().await;

    let summary: RestoreSummary = data_of(target.engine.restore_backup(&snapshot, false).await);
    assert_eq!(summary.folders_created, 0);
    assert_eq!(summary.prompts_created, 0);
    assert_eq!(summary.folders_skipped, 3);
    assert_eq!(summary.prompts_skipped, 3);
    assert_eq!(target.counts().await, after_first);
}

#[tokio::test]
async fn test_restore_into_source_store_merges() {
    let app = populated().await;
    let snapshot = app.engine.snapshot().await.expect("snapshot");

    let summary: RestoreSummary = data_of(app.engine.restore_backup(&snapshot, false).await);
    assert_eq!(summary.folders_created + summary.prompts_created, 0);
    assert_eq!(app.counts().await, (3, 3));
}

#[tokio::test]
async fn test_overwrite_replaces_instead_of_duplicating() {
    let app = populated().await;
    let snapshot = app.engine.snapshot().await.expect("snapshot");

    let standup = app
        .engine
        .prompts()
        .list_prompts(None)
        .await
        .expect("list")
        .into_iter()
        .find(|p| p.title == "Standup")
        .expect("standup");
    let edited = app
        .engine
        .update_prompt(UpdatePromptRequest {
            content: Some("Edited after the backup".into()),
            ..UpdatePromptRequest::empty(standup.id.clone())
        })
        .await;
    assert!(edited.is_success(), "{edited:?}");

    let summary: RestoreSummary = data_of(app.engine.restore_backup(&snapshot, true).await);
    assert!(summary.folders_replaced > 0);
    assert_eq!(app.counts().await, (3, 3));

    let restored = app
        .engine
        .prompts()
        .list_prompts(None)
        .await
        .expect("list")
        .into_iter()
        .find(|p| p.title == "Standup")
        .expect("standup restored");
    assert_eq!(restored.content, "Body of Standup");
}

#[tokio::test]
async fn test_inconsistent_snapshot_rolls_back_everything() {
    let source = populated().await;
    let mut snapshot = source.engine.snapshot().await.expect("snapshot");
    snapshot.prompts.push(SnapshotPrompt {
        id: "dangling".into(),
        title: "Dangling".into(),
        content: String::new(),
        folder_id: Some(FolderId::from_raw("not-in-snapshot")),
        emoji: None,
        color: None,
        url: None,
        created_at: None,
        updated_at: None,
    });

    let target = TestApp::new().await;
    let outcome = target.engine.restore_backup(&snapshot, false).await;
    assert_eq!(code_of(&outcome), ErrorKind::InvalidBackup);
    assert_eq!(target.counts().await, (0, 0));
}

#[tokio::test]
async fn test_snapshot_with_parent_outside_snapshot_is_invalid() {
    let source = populated().await;
    let mut snapshot = source.engine.snapshot().await.expect("snapshot");
    snapshot.folders.retain(|f| f.name != "Work");

    let target = TestApp::new().await;
    let outcome = target.engine.restore_backup(&snapshot, false).await;
    assert_eq!(code_of(&outcome), ErrorKind::InvalidBackup);
    assert_eq!(target.counts().await, (0, 0));
}

#[tokio::test]
async fn test_entries_outside_field_limits_are_refused() {
    let source = populated().await;
    let base = source.engine.snapshot().await.expect("snapshot");
    let standup = base
        .prompts
        .iter()
        .position(|p| p.title == "Standup")
        .expect("standup");

    let mut long_name = base.clone();
    long_name.folders[0].name = "n".repeat(400);

    let mut variants = vec![long_name];
    let edits: [fn(&mut SnapshotPrompt); 4] = [
        |p| p.title = "t".repeat(400),
        |p| p.content = "c".repeat(200_000),
        |p| p.emoji = Some("abcdef".into()),
        |p| p.url = Some("not a url".into()),
    ];
    for edit in edits {
        let mut snapshot = base.clone();
        edit(&mut snapshot.prompts[standup]);
        variants.push(snapshot);
    }

    let target = TestApp::new().await;
    for snapshot in &variants {
        let outcome = target.engine.restore_backup(snapshot, true).await;
        assert_eq!(code_of(&outcome), ErrorKind::InvalidBackup, "{outcome:?}");
        assert_eq!(target.counts().await, (0, 0));
    }
}

#[tokio::test]
async fn test_snapshot_survives_json_file_round_trip() {
    let source = populated().await;
    let snapshot = source.engine.snapshot().await.expect("snapshot");

    let path = source.dir.path().join("backup.json");
    std::fs::write(&path, serde_json::to_string_pretty(&snapshot).expect("encode"))
        .expect("write backup");
    let raw = std::fs::read_to_string(&path).expect("read backup");
    let decoded: BackupSnapshot = serde_json::from_str(&raw).expect("decode");

    let target = TestApp::new().await;
    data_of::<RestoreSummary>(target.engine.restore_backup(&decoded, false).await);
    assert_eq!(target.counts().await, (3, 3));
}
