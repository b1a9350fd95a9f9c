//! Prompt create, update, move and delete.

use std::sync::Arc;

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};
use validator::Validate;

use promptdesk_core::config::PromptDefaultsConfig;
use promptdesk_core::error::AppError;
use promptdesk_core::result::AppResult;
use promptdesk_core::types::{FolderId, PromptId};
use promptdesk_database::RetryPolicy;
use promptdesk_database::error::map_sqlx_error;
use promptdesk_database::repositories::PromptRepository;
use promptdesk_entity::prompt::{CreatePrompt, Prompt, PromptChanges, PromptColor};

use crate::integrity::IntegrityChecker;
use crate::requests::{
    CreatePromptRequest, DeletePromptRequest, MovePromptRequest, UpdatePromptRequest,
    require_confirmation,
};
use crate::verify;

/// Decorative values applied to prompts created without them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptDefaults {
    /// Marker for new prompts.
    pub emoji: String,
    /// Color for new prompts.
    pub color: PromptColor,
}

impl PromptDefaults {
    /// Resolve defaults from configuration.
    pub fn from_config(config: &PromptDefaultsConfig) -> AppResult<Self> {
        let color = config
            .default_color
            .parse::<PromptColor>()
            .map_err(|e| AppError::configuration(format!("Invalid prompts.default_color: {e}")))?;
        Ok(Self {
            emoji: config.default_emoji.clone(),
            color,
        })
    }
}

impl Default for PromptDefaults {
    fn default() -> Self {
        Self {
            emoji: "📝".to_string(),
            color: PromptColor::Gray,
        }
    }
}

/// Applies prompt mutations to the shared store.
#[derive(Debug, Clone)]
pub struct PromptService {
    /// Store connection.
    pool: SqlitePool,
    /// Prompt repository.
    prompt_repo: Arc<PromptRepository>,
    /// Pre-mutation checks.
    integrity: Arc<IntegrityChecker>,
    /// Lock-contention retry policy.
    retry: RetryPolicy,
    /// Defaults for new prompts.
    defaults: PromptDefaults,
}

impl PromptService {
    /// Creates a new prompt service.
    pub fn new(
        pool: SqlitePool,
        prompt_repo: Arc<PromptRepository>,
        integrity: Arc<IntegrityChecker>,
        retry: RetryPolicy,
        defaults: PromptDefaults,
    ) -> Self {
        Self {
            pool,
            prompt_repo,
            integrity,
            retry,
            defaults,
        }
    }

    /// Gets a prompt by ID.
    pub async fn get_prompt(&self, id: &PromptId) -> AppResult<Prompt> {
        self.integrity.require_prompt(id).await
    }

    /// Lists prompts: all of them, or those filed in one folder
    /// (`Some(None)` for unfiled prompts).
    pub async fn list_prompts(&self, folder: Option<Option<&FolderId>>) -> AppResult<Vec<Prompt>> {
        match folder {
            None => self.prompt_repo.find_all().await,
            Some(folder_id) => {
                self.integrity.require_target_folder(folder_id).await?;
                self.prompt_repo.find_by_folder(folder_id).await
            }
        }
    }

    /// Creates a prompt, filling in decorative defaults.
    pub async fn create_prompt(&self, req: CreatePromptRequest) -> AppResult<Prompt> {
        req.validate()?;

        let now = Utc::now();
        let record = CreatePrompt {
            id: req.id.clone().unwrap_or_default(),
            title: req.title,
            content: req.content,
            folder_id: req.folder_id,
            emoji: Some(req.emoji.unwrap_or_else(|| self.defaults.emoji.clone())),
            color: Some(req.color.unwrap_or(self.defaults.color)),
            url: req.url,
            created_at: now,
            updated_at: now,
        };

        if req.id.is_some() {
            if let Some(existing) = self.prompt_repo.find_by_id(&record.id).await? {
                return replayed_create(existing, &record);
            }
        }

        self.integrity
            .require_target_folder(record.folder_id.as_ref())
            .await?;

        let prompt = self
            .retry
            .run("create_prompt", || self.insert_once(&record))
            .await?;

        let found = self.prompt_repo.find_by_id(&prompt.id).await?;
        let prompt = verify::prompt_written(found, &prompt)?;

        info!(
            prompt_id = %prompt.id,
            folder_id = ?prompt.folder_id,
            "Prompt created"
        );

        Ok(prompt)
    }

    /// Applies the fields present in the request. A request that changes
    /// nothing succeeds without opening a transaction.
    ///
    /// The change-set is applied to the row as read inside the writing
    /// transaction, so fields the request does not name keep whatever the
    /// host committed in the meantime.
    pub async fn update_prompt(&self, req: UpdatePromptRequest) -> AppResult<Prompt> {
        req.validate()?;

        let changes = req.changes();
        let current = self.integrity.require_prompt(&req.prompt_id).await?;
        if changes.is_reflected_in(&current) {
            debug!(prompt_id = %current.id, "Prompt update changes nothing");
            return Ok(current);
        }

        if let Some(folder_id) = &changes.folder_id {
            if *folder_id != current.folder_id {
                self.integrity
                    .require_target_folder(folder_id.as_ref())
                    .await?;
            }
        }

        let updated = self
            .retry
            .run("update_prompt", || self.update_once(&current.id, &changes))
            .await?;

        let found = self.prompt_repo.find_by_id(&updated.id).await?;
        let prompt = verify::prompt_changes_written(found, &updated.id, &changes)?;

        info!(prompt_id = %prompt.id, "Prompt updated");
        Ok(prompt)
    }

    /// Moves a prompt to another folder, or out of every folder, keeping
    /// its identity.
    pub async fn move_prompt(&self, req: MovePromptRequest) -> AppResult<Prompt> {
        let current = self.integrity.require_prompt(&req.prompt_id).await?;
        self.integrity
            .require_target_folder(req.folder_id.as_ref())
            .await?;

        if current.folder_id == req.folder_id {
            debug!(prompt_id = %current.id, "Prompt already in target folder");
            return Ok(current);
        }

        let moved = self
            .retry
            .run("move_prompt", || {
                self.move_once(&current.id, req.folder_id.as_ref())
            })
            .await?;

        let found = self.prompt_repo.find_by_id(&moved.id).await?;
        let prompt = verify::prompt_written(found, &moved)?;

        info!(
            prompt_id = %prompt.id,
            from = ?current.folder_id,
            to = ?prompt.folder_id,
            "Prompt moved"
        );

        Ok(prompt)
    }

    /// Deletes a prompt.
    pub async fn delete_prompt(&self, req: DeletePromptRequest) -> AppResult<Prompt> {
        require_confirmation(req.confirm, &format!("prompt '{}'", req.prompt_id))?;

        let prompt = self.integrity.require_prompt(&req.prompt_id).await?;

        self.retry
            .run("delete_prompt", || self.delete_once(&prompt.id))
            .await?;

        let found = self.prompt_repo.find_by_id(&prompt.id).await?;
        verify::removed(found, "Prompt", prompt.id.as_str())?;

        info!(prompt_id = %prompt.id, "Prompt deleted");
        Ok(prompt)
    }

    async fn insert_once(&self, record: &CreatePrompt) -> AppResult<Prompt> {
        let mut tx = self.begin().await?;
        let prompt = self.prompt_repo.insert_tx(&mut *tx, record).await?;
        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("Failed to commit prompt creation", e))?;
        Ok(prompt)
    }

    async fn update_once(&self, id: &PromptId, changes: &PromptChanges) -> AppResult<Prompt> {
        let mut tx = self.begin().await?;
        let fresh = self
            .prompt_repo
            .find_by_id_tx(&mut *tx, id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Prompt '{id}' not found")))?;

        let next = changes.apply(&fresh);
        if next.same_fields(&fresh) {
            debug!(prompt_id = %id, "Prompt already holds the requested values");
            return Ok(fresh);
        }

        let prompt = self
            .prompt_repo
            .update_tx(&mut *tx, &next, Utc::now())
            .await?
            .ok_or_else(|| AppError::not_found(format!("Prompt '{id}' not found")))?;
        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("Failed to commit prompt update", e))?;
        Ok(prompt)
    }

    async fn move_once(&self, id: &PromptId, folder_id: Option<&FolderId>) -> AppResult<Prompt> {
        let mut tx = self.begin().await?;
        let prompt = self
            .prompt_repo
            .move_tx(&mut *tx, id, folder_id, Utc::now())
            .await?
            .ok_or_else(|| AppError::not_found(format!("Prompt '{id}' not found")))?;
        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("Failed to commit prompt move", e))?;
        Ok(prompt)
    }

    async fn delete_once(&self, id: &PromptId) -> AppResult<()> {
        let mut tx = self.begin().await?;
        if !self.prompt_repo.delete_tx(&mut *tx, id).await? {
            return Err(AppError::not_found(format!("Prompt '{id}' not found")));
        }
        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("Failed to commit prompt deletion", e))?;
        Ok(())
    }

    async fn begin(&self) -> AppResult<sqlx::Transaction<'static, sqlx::Sqlite>> {
        self.pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("Failed to begin transaction", e))
    }
}

/// A create carrying an id that already exists is a replay when the
/// fields match, and a conflict otherwise.
fn replayed_create(existing: Prompt, record: &CreatePrompt) -> AppResult<Prompt> {
    let same = existing.title == record.title
        && existing.content == record.content
        && existing.folder_id == record.folder_id;
    if same {
        info!(prompt_id = %existing.id, "Prompt create replayed, returning existing prompt");
        Ok(existing)
    } else {
        Err(AppError::conflict(format!(
            "Prompt id '{}' is already used by a different prompt",
            existing.id
        )))
    }
}
