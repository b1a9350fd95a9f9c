//! Integration tests for folder create, update and delete.

mod helpers;

use promptdesk_core::error::ErrorKind;
use promptdesk_core::types::{FolderId, PromptId};
use promptdesk_entity::folder::Folder;
use promptdesk_service::requests::{CreateFolderRequest, DeleteFolderRequest, UpdateFolderRequest};

use helpers::{TestApp, assert_acyclic, code_of, data_of};

fn reparent(folder: &Folder, parent: Option<&FolderId>) -> UpdateFolderRequest {
    UpdateFolderRequest {
        folder_id: folder.id.clone(),
        name: None,
        parent_id: Some(parent.cloned()),
    }
}

fn delete(folder: &Folder, recursive: bool) -> DeleteFolderRequest {
    DeleteFolderRequest {
        folder_id: folder.id.clone(),
        recursive,
        confirm: true,
    }
}

#[tokio::test]
async fn test_reparent_into_own_descendant_is_a_cycle() {
    let app = TestApp::new().await;
    let a = app.folder("A", None).await;
    let b = app.folder("B", Some(&a.id)).await;

    let outcome = app.engine.update_folder(reparent(&a, Some(&b.id))).await;
    assert_eq!(code_of(&outcome), ErrorKind::Cycle);

    let a_now = app.engine.folders().get_folder(&a.id).await.expect("A");
    assert!(a_now.is_root());
    assert_acyclic(&app.all_folders().await);
}

#[tokio::test]
async fn test_folder_cannot_be_its_own_parent() {
    let app = TestApp::new().await;
    let a = app.folder("A", None).await;

    let outcome = app.engine.update_folder(reparent(&a, Some(&a.id))).await;
    assert_eq!(code_of(&outcome), ErrorKind::Cycle);
}

#[tokio::test]
async fn test_valid_reparents_keep_hierarchy_acyclic() {
    let app = TestApp::new().await;
    let a = app.folder("A", None).await;
    let b = app.folder("B", Some(&a.id)).await;
    let c = app.folder("C", None).await;

    let moved: Folder = data_of(app.engine.update_folder(reparent(&c, Some(&b.id))).await);
    assert_eq!(moved.parent_id, Some(b.id.clone()));

    let back: Folder = data_of(app.engine.update_folder(reparent(&b, None)).await);
    assert!(back.is_root());

    assert_acyclic(&app.all_folders().await);
}

#[tokio::test]
async fn test_sibling_names_stay_distinct() {
    let app = TestApp::new().await;
    let work = app.folder("Work", None).await;
    let personal = app.folder("Personal", None).await;
    app.folder("Notes", Some(&work.id)).await;
    let other_notes = app.folder("Notes", Some(&personal.id)).await;

    let duplicate = app
        .engine
        .create_folder(CreateFolderRequest {
            name: "Work".into(),
            ..Default::default()
        })
        .await;
    assert_eq!(code_of(&duplicate), ErrorKind::Conflict);

    let rename = app
        .engine
        .update_folder(UpdateFolderRequest {
            folder_id: personal.id.clone(),
            name: Some("Work".into()),
            parent_id: None,
        })
        .await;
    assert_eq!(code_of(&rename), ErrorKind::Conflict);

    let clash = app
        .engine
        .update_folder(reparent(&other_notes, Some(&work.id)))
        .await;
    assert_eq!(code_of(&clash), ErrorKind::Conflict);

    let folders = app.all_folders().await;
    for (i, a) in folders.iter().enumerate() {
        for b in &folders[i + 1..] {
            assert!(
                !(a.parent_id == b.parent_id && a.name == b.name),
                "Siblings share the name '{}'",
                a.name
            );
        }
    }
}

#[tokio::test]
async fn test_create_under_missing_parent_is_not_found() {
    let app = TestApp::new().await;
    let outcome = app
        .engine
        .create_folder(CreateFolderRequest {
            name: "Orphan".into(),
            parent_id: Some(FolderId::from_raw("missing")),
            ..Default::default()
        })
        .await;
    assert_eq!(code_of(&outcome), ErrorKind::NotFound);
    assert_eq!(app.counts().await, (0, 0));
}

#[tokio::test]
async fn test_blank_name_is_rejected_before_store_access() {
    let app = TestApp::new().await;
    let outcome = app
        .engine
        .create_folder(CreateFolderRequest {
            name: "   ".into(),
            ..Default::default()
        })
        .await;
    assert_eq!(code_of(&outcome), ErrorKind::Validation);
}

#[tokio::test]
async fn test_create_with_client_id_is_replay_safe() {
    let app = TestApp::new().await;
    let req = CreateFolderRequest {
        id: Some(FolderId::from_raw("client-1")),
        name: "Inbox".into(),
        parent_id: None,
    };

    let first: Folder = data_of(app.engine.create_folder(req.clone()).await);
    let second: Folder = data_of(app.engine.create_folder(req.clone()).await);
    assert_eq!(first, second);
    assert_eq!(app.counts().await, (1, 0));

    let different = app
        .engine
        .create_folder(CreateFolderRequest {
            name: "Outbox".into(),
            ..req
        })
        .await;
    assert_eq!(code_of(&different), ErrorKind::Conflict);
}

#[tokio::test]
async fn test_update_without_changes_is_a_noop() {
    let app = TestApp::new().await;
    let folder = app.folder("Static", None).await;

    let outcome = app
        .engine
        .update_folder(UpdateFolderRequest {
            folder_id: folder.id.clone(),
            name: Some("Static".into()),
            parent_id: None,
        })
        .await;
    let after: Folder = data_of(outcome);
    assert_eq!(after, folder);
}

#[tokio::test]
async fn test_non_recursive_delete_of_non_empty_folder_changes_nothing() {
    let app = TestApp::new().await;
    let parent = app.folder("Parent", None).await;
    app.folder("Child", Some(&parent.id)).await;
    let before = app.counts().await;

    let outcome = app.engine.delete_folder(delete(&parent, false)).await;
    assert_eq!(code_of(&outcome), ErrorKind::NotEmpty);
    assert_eq!(app.counts().await, before);

    let only_prompt = app.folder("Holder", None).await;
    app.prompt("Inside", Some(&only_prompt.id)).await;
    let outcome = app.engine.delete_folder(delete(&only_prompt, false)).await;
    assert_eq!(code_of(&outcome), ErrorKind::NotEmpty);
}

#[tokio::test]
async fn test_empty_folder_deletes_without_recursion() {
    let app = TestApp::new().await;
    let folder = app.folder("Empty", None).await;

    let outcome = app.engine.delete_folder(delete(&folder, false)).await;
    assert!(outcome.is_success(), "{outcome:?}");
    assert_eq!(app.counts().await, (0, 0));
}

#[tokio::test]
async fn test_recursive_delete_removes_exactly_the_subtree() {
    let app = TestApp::new().await;
    let a = app.folder("A", None).await;
    let b = app.folder("B", Some(&a.id)).await;
    let c = app.folder("C", Some(&b.id)).await;
    app.prompt("In A", Some(&a.id)).await;
    app.prompt("In C", Some(&c.id)).await;

    let d = app.folder("D", None).await;
    let e = app.folder("E", Some(&d.id)).await;
    let kept_prompt = app.prompt("In E", Some(&e.id)).await;
    let unfiled = app.prompt("Unfiled", None).await;

    let outcome = app.engine.delete_folder(delete(&a, true)).await;
    assert!(outcome.is_success(), "{outcome:?}");
    let data = outcome.data.expect("deletion report");
    assert_eq!(data["foldersDeleted"], 3);
    assert_eq!(data["promptsDeleted"], 2);

    assert_eq!(app.counts().await, (2, 2));
    for id in [&a.id, &b.id, &c.id] {
        let err = app.engine.folders().get_folder(id).await.expect_err("gone");
        assert_eq!(err.kind, ErrorKind::NotFound);
    }
    assert!(app.engine.folders().get_folder(&d.id).await.is_ok());
    assert!(app.engine.prompts().get_prompt(&kept_prompt.id).await.is_ok());
    assert!(app.engine.prompts().get_prompt(&unfiled.id).await.is_ok());
}

#[tokio::test]
async fn test_delete_requires_confirmation() {
    let app = TestApp::new().await;
    let folder = app.folder("Keep", None).await;

    let outcome = app
        .engine
        .delete_folder(DeleteFolderRequest {
            folder_id: folder.id.clone(),
            recursive: true,
            confirm: false,
        })
        .await;
    assert_eq!(code_of(&outcome), ErrorKind::ConfirmationRequired);
    assert_eq!(app.counts().await, (1, 0));
}

#[tokio::test]
async fn test_security_folder_scenario() {
    let app = TestApp::new().await;
    let security = app.folder("Security", None).await;
    let checklist = app.prompt("Checklist", Some(&security.id)).await;

    let refused = app.engine.delete_folder(delete(&security, false)).await;
    assert_eq!(code_of(&refused), ErrorKind::NotEmpty);

    let removed = app.engine.delete_folder(delete(&security, true)).await;
    assert!(removed.is_success(), "{removed:?}");

    let lookup = app.engine.get_prompt(&checklist.id).await;
    assert_eq!(code_of(&lookup), ErrorKind::NotFound);

    let missing = app.engine.get_prompt(&PromptId::from_raw("never")).await;
    assert_eq!(code_of(&missing), ErrorKind::NotFound);
}
