//! Prompt management CLI commands.

use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use promptdesk_core::config::AppConfig;
use promptdesk_core::result::AppResult;
use promptdesk_core::types::{FolderId, PromptId};
use promptdesk_entity::prompt::{Prompt, PromptColor};
use promptdesk_service::requests::{
    CreatePromptRequest, DeletePromptRequest, MovePromptRequest, UpdatePromptRequest,
};

use crate::output::{self, OutputFormat};

/// Arguments for prompt commands
#[derive(Debug, Args)]
pub struct PromptArgs {
    /// Prompt subcommand
    #[command(subcommand)]
    pub command: PromptCommand,
}

/// Prompt subcommands
#[derive(Debug, Subcommand)]
pub enum PromptCommand {
    /// List prompts
    List {
        /// Only prompts filed in this folder
        #[arg(long, conflicts_with = "unfiled")]
        folder: Option<FolderId>,
        /// Only prompts outside every folder
        #[arg(long)]
        unfiled: bool,
    },
    /// Show one prompt
    Get {
        /// Prompt ID
        id: PromptId,
    },
    /// Create a new prompt
    Create {
        /// Title
        #[arg(short, long)]
        title: String,
        /// Body text
        #[arg(short, long, conflicts_with = "content_file")]
        content: Option<String>,
        /// Read the body from a file
        #[arg(long)]
        content_file: Option<PathBuf>,
        /// Containing folder ID
        #[arg(long)]
        folder: Option<FolderId>,
        /// Emoji marker
        #[arg(long)]
        emoji: Option<String>,
        /// Color tag
        #[arg(long)]
        color: Option<PromptColor>,
        /// Related link
        #[arg(long)]
        url: Option<String>,
        /// Client-chosen prompt ID, makes the create safe to re-send
        #[arg(long)]
        id: Option<PromptId>,
    },
    /// Change selected fields of a prompt
    Update {
        /// Prompt ID
        id: PromptId,
        /// New title
        #[arg(short, long)]
        title: Option<String>,
        /// New body text
        #[arg(short, long, conflicts_with = "content_file")]
        content: Option<String>,
        /// Read the new body from a file
        #[arg(long)]
        content_file: Option<PathBuf>,
        /// New folder ID
        #[arg(long, conflicts_with = "unfiled")]
        folder: Option<FolderId>,
        /// Take the prompt out of its folder
        #[arg(long)]
        unfiled: bool,
        /// New emoji marker
        #[arg(long, conflicts_with = "clear_emoji")]
        emoji: Option<String>,
        /// Remove the emoji marker
        #[arg(long)]
        clear_emoji: bool,
        /// New color tag
        #[arg(long, conflicts_with = "clear_color")]
        color: Option<PromptColor>,
        /// Remove the color tag
        #[arg(long)]
        clear_color: bool,
        /// New link
        #[arg(long, conflicts_with = "clear_url")]
        url: Option<String>,
        /// Remove the link
        #[arg(long)]
        clear_url: bool,
    },
    /// Move a prompt to another folder
    Move {
        /// Prompt ID
        id: PromptId,
        /// Destination folder ID (omit to unfile)
        #[arg(long)]
        folder: Option<FolderId>,
    },
    /// Delete a prompt
    Delete {
        /// Prompt ID
        id: PromptId,
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
}

/// Prompt display row
#[derive(Debug, Serialize, Tabled)]
struct PromptRow {
    /// Prompt ID
    id: String,
    /// Marker
    emoji: String,
    /// Title
    title: String,
    /// Folder ID
    folder: String,
    /// Color
    color: String,
    /// Updated at
    updated_at: String,
}

impl From<&Prompt> for PromptRow {
    fn from(p: &Prompt) -> Self {
        Self {
            id: p.id.to_string(),
            emoji: p.emoji.clone().unwrap_or_default(),
            title: p.title.clone(),
            folder: p
                .folder_id
                .as_ref()
                .map_or_else(|| "-".to_string(), ToString::to_string),
            color: p.color.map(|c| c.to_string()).unwrap_or_default(),
            updated_at: p.updated_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

/// Execute prompt commands
pub async fn execute(args: &PromptArgs, config: &AppConfig, format: OutputFormat) -> AppResult<bool> {
    let writes = !matches!(
        args.command,
        PromptCommand::List { .. } | PromptCommand::Get { .. }
    );
    let engine = match super::open_engine(config, writes).await {
        Ok(engine) => engine,
        Err(e) => return Ok(output::print_rejection(&e)),
    };

    let ok = match &args.command {
        PromptCommand::List { folder, unfiled } => {
            let filter = if *unfiled {
                Some(None)
            } else {
                folder.as_ref().map(Some)
            };
            match engine.prompts().list_prompts(filter).await {
                Ok(prompts) => {
                    let rows: Vec<PromptRow> = prompts.iter().map(PromptRow::from).collect();
                    output::print_list(&rows, format);
                    true
                }
                Err(e) => output::print_rejection(&e),
            }
        }
        PromptCommand::Get { id } => output::print_outcome(&engine.get_prompt(id).await),
        PromptCommand::Create {
            title,
            content,
            content_file,
            folder,
            emoji,
            color,
            url,
            id,
        } => {
            let body =
                read_content(content.as_deref(), content_file.as_deref())?.unwrap_or_default();
            let req = CreatePromptRequest {
                id: id.clone(),
                title: title.clone(),
                content: body,
                folder_id: folder.clone(),
                emoji: emoji.clone(),
                color: *color,
                url: url.clone(),
            };
            output::print_outcome(&engine.create_prompt(req).await)
        }
        PromptCommand::Update {
            id,
            title,
            content,
            content_file,
            folder,
            unfiled,
            emoji,
            clear_emoji,
            color,
            clear_color,
            url,
            clear_url,
        } => {
            let req = UpdatePromptRequest {
                title: title.clone(),
                content: read_content(content.as_deref(), content_file.as_deref())?,
                folder_id: set_or_clear(folder, *unfiled),
                emoji: set_or_clear(emoji, *clear_emoji),
                color: set_or_clear(color, *clear_color),
                url: set_or_clear(url, *clear_url),
                ..UpdatePromptRequest::empty(id.clone())
            };
            output::print_outcome(&engine.update_prompt(req).await)
        }
        PromptCommand::Move { id, folder } => {
            let req = MovePromptRequest {
                prompt_id: id.clone(),
                folder_id: folder.clone(),
            };
            output::print_outcome(&engine.move_prompt(req).await)
        }
        PromptCommand::Delete { id, yes } => {
            let req = DeletePromptRequest {
                prompt_id: id.clone(),
                confirm: *yes,
            };
            output::print_outcome(&engine.delete_prompt(req).await)
        }
    };

    engine.close().await;
    Ok(ok)
}

fn read_content(inline: Option<&str>, file: Option<&Path>) -> AppResult<Option<String>> {
    match file {
        Some(path) => Ok(Some(std::fs::read_to_string(path)?)),
        None => Ok(inline.map(str::to_string)),
    }
}

/// Map a value flag and its clearing flag onto a partial-update field.
fn set_or_clear<T: Clone>(value: &Option<T>, clear: bool) -> Option<Option<T>> {
    if clear {
        Some(None)
    } else {
        value.clone().map(Some)
    }
}
