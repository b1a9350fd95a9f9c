//! Typed mutation requests handed to the engine by the caller layer.
//!
//! Field-level rules are declared with `validator` and checked before any
//! store access. Destructive requests carry an explicit `confirm` flag.
//! Restore applies the same rules to snapshot entries.

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidateUrl, ValidationError};

use promptdesk_core::error::AppError;
use promptdesk_core::result::AppResult;
use promptdesk_core::types::{FolderId, PromptId};
use promptdesk_entity::folder::FolderChanges;
use promptdesk_entity::prompt::{PromptChanges, PromptColor};

/// Maximum folder name and prompt title length in characters.
pub const MAX_NAME_CHARS: usize = 255;

/// Maximum prompt body size in bytes.
pub const MAX_CONTENT_BYTES: usize = 100_000;

/// Request to create a folder.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateFolderRequest {
    /// Caller-chosen identity. Re-sending a create with the same id and
    /// fields returns the existing folder instead of a duplicate.
    #[serde(default)]
    pub id: Option<FolderId>,
    /// Folder name.
    #[validate(custom(function = "bounded_name"))]
    pub name: String,
    /// Parent folder (None for root).
    #[serde(default)]
    pub parent_id: Option<FolderId>,
}

/// Request to rename and/or reparent a folder.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFolderRequest {
    /// Folder to change.
    pub folder_id: FolderId,
    /// New name.
    #[serde(default)]
    #[validate(custom(function = "bounded_name"))]
    pub name: Option<String>,
    /// New parent; `Some(None)` moves the folder to the root.
    #[serde(default, deserialize_with = "promptdesk_entity::folder::model::present_or_null")]
    pub parent_id: Option<Option<FolderId>>,
}

impl UpdateFolderRequest {
    /// The change-set carried by this request.
    pub fn changes(&self) -> FolderChanges {
        FolderChanges {
            name: self.name.clone(),
            parent_id: self.parent_id.clone(),
        }
    }
}

/// Request to delete a folder.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteFolderRequest {
    /// Folder to delete.
    pub folder_id: FolderId,
    /// Also delete every descendant folder and prompt.
    #[serde(default)]
    pub recursive: bool,
    /// Explicit caller intent.
    #[serde(default)]
    pub confirm: bool,
}

/// Request to create a prompt.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePromptRequest {
    /// Caller-chosen identity, see [`CreateFolderRequest::id`].
    #[serde(default)]
    pub id: Option<PromptId>,
    /// Display title.
    #[validate(custom(function = "bounded_name"))]
    pub title: String,
    /// Prompt body.
    #[serde(default)]
    #[validate(custom(function = "content_size"))]
    pub content: String,
    /// Containing folder.
    #[serde(default)]
    pub folder_id: Option<FolderId>,
    /// Decorative marker; the configured default when absent.
    #[serde(default)]
    #[validate(custom(function = "short_marker"))]
    pub emoji: Option<String>,
    /// Color tag; the configured default when absent.
    #[serde(default)]
    pub color: Option<PromptColor>,
    /// Related link.
    #[serde(default)]
    #[validate(custom(function = "well_formed_url"))]
    pub url: Option<String>,
}

/// Partial update of a prompt.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePromptRequest {
    /// Prompt to change.
    pub prompt_id: PromptId,
    /// New title.
    #[serde(default)]
    #[validate(custom(function = "bounded_name"))]
    pub title: Option<String>,
    /// New body.
    #[serde(default)]
    #[validate(custom(function = "content_size"))]
    pub content: Option<String>,
    /// New folder; `Some(None)` unfiles the prompt.
    #[serde(default, deserialize_with = "promptdesk_entity::folder::model::present_or_null")]
    pub folder_id: Option<Option<FolderId>>,
    /// New marker; `Some(None)` clears it.
    #[serde(default, deserialize_with = "promptdesk_entity::folder::model::present_or_null")]
    #[validate(custom(function = "short_marker"))]
    pub emoji: Option<Option<String>>,
    /// New color; `Some(None)` clears it.
    #[serde(default, deserialize_with = "promptdesk_entity::folder::model::present_or_null")]
    pub color: Option<Option<PromptColor>>,
    /// New link; `Some(None)` clears it.
    #[serde(default, deserialize_with = "promptdesk_entity::folder::model::present_or_null")]
    #[validate(custom(function = "well_formed_url"))]
    pub url: Option<Option<String>>,
}

impl UpdatePromptRequest {
    /// An update that changes nothing.
    pub fn empty(prompt_id: PromptId) -> Self {
        Self {
            prompt_id,
            title: None,
            content: None,
            folder_id: None,
            emoji: None,
            color: None,
            url: None,
        }
    }

    /// The change-set carried by this request.
    pub fn changes(&self) -> PromptChanges {
        PromptChanges {
            title: self.title.clone(),
            content: self.content.clone(),
            folder_id: self.folder_id.clone(),
            emoji: self.emoji.clone(),
            color: self.color,
            url: self.url.clone(),
        }
    }
}

/// Request to delete a prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletePromptRequest {
    /// Prompt to delete.
    pub prompt_id: PromptId,
    /// Explicit caller intent.
    #[serde(default)]
    pub confirm: bool,
}

/// Request to move a prompt between folders without changing its identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovePromptRequest {
    /// Prompt to move.
    pub prompt_id: PromptId,
    /// Destination folder; `None` unfiles the prompt.
    #[serde(default)]
    pub folder_id: Option<FolderId>,
}

/// Reject a destructive request that was not explicitly confirmed.
pub fn require_confirmation(confirm: bool, what: &str) -> AppResult<()> {
    if confirm {
        Ok(())
    } else {
        Err(AppError::confirmation_required(format!(
            "Deleting {what} requires explicit confirmation"
        )))
    }
}

/// A name or title: not blank and at most [`MAX_NAME_CHARS`] characters.
pub(crate) fn bounded_name(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(rule_error("blank", "must not be blank".to_string()));
    }
    if value.chars().count() > MAX_NAME_CHARS {
        return Err(rule_error(
            "too_long",
            format!("must be at most {MAX_NAME_CHARS} characters"),
        ));
    }
    Ok(())
}

pub(crate) fn content_size(value: &str) -> Result<(), ValidationError> {
    if value.len() > MAX_CONTENT_BYTES {
        return Err(rule_error(
            "too_large",
            format!("must be at most {MAX_CONTENT_BYTES} bytes"),
        ));
    }
    Ok(())
}

pub(crate) fn short_marker(value: &str) -> Result<(), ValidationError> {
    let count = value.chars().count();
    if !(1..=2).contains(&count) {
        return Err(rule_error("marker_length", "must be 1 or 2 characters".to_string()));
    }
    Ok(())
}

pub(crate) fn well_formed_url(value: &str) -> Result<(), ValidationError> {
    if !value.validate_url() {
        return Err(rule_error("url", "must be a valid URL".to_string()));
    }
    Ok(())
}

fn rule_error(code: &'static str, message: String) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}
