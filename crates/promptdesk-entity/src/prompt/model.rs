//! Prompt entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use promptdesk_core::types::{FolderId, PromptId};

use super::color::PromptColor;
use crate::folder::model::present_or_null;

/// A stored prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Prompt {
    /// Unique prompt identifier.
    pub id: PromptId,
    /// Display title.
    pub title: String,
    /// Prompt body.
    pub content: String,
    /// Containing folder (null when unfiled).
    pub folder_id: Option<FolderId>,
    /// Short decorative marker.
    pub emoji: Option<String>,
    /// Decorative color tag.
    pub color: Option<PromptColor>,
    /// Related link.
    pub url: Option<String>,
    /// When the prompt was created.
    pub created_at: DateTime<Utc>,
    /// When the prompt was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Prompt {
    /// Whether the prompt sits outside every folder.
    pub fn is_unfiled(&self) -> bool {
        self.folder_id.is_none()
    }

    /// Compare everything except the timestamps.
    pub fn same_fields(&self, other: &Prompt) -> bool {
        self.id == other.id
            && self.title == other.title
            && self.content == other.content
            && self.folder_id == other.folder_id
            && self.emoji == other.emoji
            && self.color == other.color
            && self.url == other.url
    }
}

/// Data required to insert a prompt row. Defaults are already applied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePrompt {
    /// Identity of the new row.
    pub id: PromptId,
    /// Display title.
    pub title: String,
    /// Prompt body.
    pub content: String,
    /// Containing folder.
    pub folder_id: Option<FolderId>,
    /// Decorative marker.
    pub emoji: Option<String>,
    /// Color tag.
    pub color: Option<PromptColor>,
    /// Related link.
    pub url: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

/// Partial update of a prompt. Only present fields are written.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptChanges {
    /// New title.
    #[serde(default)]
    pub title: Option<String>,
    /// New body.
    #[serde(default)]
    pub content: Option<String>,
    /// New folder; `Some(None)` unfiles the prompt.
    #[serde(default, deserialize_with = "present_or_null")]
    pub folder_id: Option<Option<FolderId>>,
    /// New marker; `Some(None)` clears it.
    #[serde(default, deserialize_with = "present_or_null")]
    pub emoji: Option<Option<String>>,
    /// New color; `Some(None)` clears it.
    #[serde(default, deserialize_with = "present_or_null")]
    pub color: Option<Option<PromptColor>>,
    /// New link; `Some(None)` clears it.
    #[serde(default, deserialize_with = "present_or_null")]
    pub url: Option<Option<String>>,
}

impl PromptChanges {
    /// Whether no field is present.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.folder_id.is_none()
            && self.emoji.is_none()
            && self.color.is_none()
            && self.url.is_none()
    }

    /// Produce the prompt as it should look once the changes are applied.
    /// Timestamps are left untouched.
    pub fn apply(&self, prompt: &Prompt) -> Prompt {
        let mut next = prompt.clone();
        if let Some(title) = &self.title {
            next.title = title.clone();
        }
        if let Some(content) = &self.content {
            next.content = content.clone();
        }
        if let Some(folder_id) = &self.folder_id {
            next.folder_id = folder_id.clone();
        }
        if let Some(emoji) = &self.emoji {
            next.emoji = emoji.clone();
        }
        if let Some(color) = self.color {
            next.color = color;
        }
        if let Some(url) = &self.url {
            next.url = url.clone();
        }
        next
    }

    /// Whether every present field already holds its new value in `prompt`.
    pub fn is_reflected_in(&self, prompt: &Prompt) -> bool {
        self.apply(prompt).same_fields(prompt)
    }
}
