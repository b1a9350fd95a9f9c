//! Verify-after-write assertions.
//!
//! After a commit the affected rows are read back on a fresh statement.
//! If the store does not show what was just written, the operation reports
//! `VERIFICATION_FAILED` instead of success.

use tracing::error;

use promptdesk_core::error::AppError;
use promptdesk_core::result::AppResult;
use promptdesk_core::types::{FolderId, PromptId};
use promptdesk_entity::folder::{Folder, FolderChanges};
use promptdesk_entity::prompt::{Prompt, PromptChanges};

/// Confirm a folder row is visible with the expected name and parent.
pub fn folder_written(found: Option<Folder>, expected: &Folder) -> AppResult<Folder> {
    match found {
        Some(folder) if folder.name == expected.name && folder.parent_id == expected.parent_id => {
            Ok(folder)
        }
        Some(_) => Err(lost_update("Folder", expected.id.as_str(), "was changed")),
        None => Err(lost_update("Folder", expected.id.as_str(), "is not visible")),
    }
}

/// Confirm a prompt row is visible with the expected field values.
pub fn prompt_written(found: Option<Prompt>, expected: &Prompt) -> AppResult<Prompt> {
    match found {
        Some(prompt) if prompt.same_fields(expected) => Ok(prompt),
        Some(_) => Err(lost_update("Prompt", expected.id.as_str(), "was changed")),
        None => Err(lost_update("Prompt", expected.id.as_str(), "is not visible")),
    }
}

/// Confirm a partial folder update is visible. Only the fields present in
/// `changes` are compared; the rest may legitimately belong to another
/// writer.
pub fn folder_changes_written(
    found: Option<Folder>,
    id: &FolderId,
    changes: &FolderChanges,
) -> AppResult<Folder> {
    match found {
        Some(folder) if changes.is_reflected_in(&folder) => Ok(folder),
        Some(_) => Err(lost_update("Folder", id.as_str(), "was changed")),
        None => Err(lost_update("Folder", id.as_str(), "is not visible")),
    }
}

/// Confirm a partial prompt update is visible, comparing only the fields
/// present in `changes`.
pub fn prompt_changes_written(
    found: Option<Prompt>,
    id: &PromptId,
    changes: &PromptChanges,
) -> AppResult<Prompt> {
    match found {
        Some(prompt) if changes.is_reflected_in(&prompt) => Ok(prompt),
        Some(_) => Err(lost_update("Prompt", id.as_str(), "was changed")),
        None => Err(lost_update("Prompt", id.as_str(), "is not visible")),
    }
}

/// Confirm a deleted row is gone.
pub fn removed<T>(found: Option<T>, entity: &str, id: &str) -> AppResult<()> {
    match found {
        None => Ok(()),
        Some(_) => Err(lost_update(entity, id, "is still present")),
    }
}

fn lost_update(entity: &str, id: &str, what: &str) -> AppError {
    error!(entity, id, what, "Committed change is not visible on read-back");
    AppError::verification_failed(format!(
        "{entity} '{id}' {what} after commit; the change may have been overwritten by another writer"
    ))
}
