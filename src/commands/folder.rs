//! Folder management CLI commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use promptdesk_core::config::AppConfig;
use promptdesk_core::result::AppResult;
use promptdesk_core::types::FolderId;
use promptdesk_entity::folder::Folder;
use promptdesk_service::requests::{CreateFolderRequest, DeleteFolderRequest, UpdateFolderRequest};

use crate::output::{self, OutputFormat};

/// Arguments for folder commands
#[derive(Debug, Args)]
pub struct FolderArgs {
    /// Folder subcommand
    #[command(subcommand)]
    pub command: FolderCommand,
}

/// Folder subcommands
#[derive(Debug, Subcommand)]
pub enum FolderCommand {
    /// List folders
    List {
        /// Only the children of this folder
        #[arg(short, long, conflicts_with = "root")]
        parent: Option<FolderId>,
        /// Only root-level folders
        #[arg(long)]
        root: bool,
    },
    /// Create a new folder
    Create {
        /// Folder name
        #[arg(short, long)]
        name: String,
        /// Parent folder ID (omit for root)
        #[arg(short, long)]
        parent: Option<FolderId>,
        /// Client-chosen folder ID, makes the create safe to re-send
        #[arg(long)]
        id: Option<FolderId>,
    },
    /// Rename and/or move a folder
    Update {
        /// Folder ID
        id: FolderId,
        /// New name
        #[arg(short, long)]
        name: Option<String>,
        /// New parent folder ID
        #[arg(short, long, conflicts_with = "root")]
        parent: Option<FolderId>,
        /// Move the folder to the root level
        #[arg(long)]
        root: bool,
    },
    /// Delete a folder
    Delete {
        /// Folder ID
        id: FolderId,
        /// Also delete every subfolder and prompt inside it
        #[arg(short, long)]
        recursive: bool,
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
}

/// Folder display row
#[derive(Debug, Serialize, Tabled)]
struct FolderRow {
    /// Folder ID
    id: String,
    /// Name
    name: String,
    /// Parent ID
    parent: String,
    /// Updated at
    updated_at: String,
}

impl From<&Folder> for FolderRow {
    fn from(f: &Folder) -> Self {
        Self {
            id: f.id.to_string(),
            name: f.name.clone(),
            parent: f
                .parent_id
                .as_ref()
                .map_or_else(|| "-".to_string(), ToString::to_string),
            updated_at: f.updated_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

/// Execute folder commands
pub async fn execute(args: &FolderArgs, config: &AppConfig, format: OutputFormat) -> AppResult<bool> {
    let writes = !matches!(args.command, FolderCommand::List { .. });
    let engine = match super::open_engine(config, writes).await {
        Ok(engine) => engine,
        Err(e) => return Ok(output::print_rejection(&e)),
    };

    let ok = match &args.command {
        FolderCommand::List { parent, root } => {
            let filter = if *root {
                Some(None)
            } else {
                parent.as_ref().map(Some)
            };
            match engine.folders().list_folders(filter).await {
                Ok(folders) => {
                    let rows: Vec<FolderRow> = folders.iter().map(FolderRow::from).collect();
                    output::print_list(&rows, format);
                    true
                }
                Err(e) => output::print_rejection(&e),
            }
        }
        FolderCommand::Create { name, parent, id } => {
            let req = CreateFolderRequest {
                id: id.clone(),
                name: name.clone(),
                parent_id: parent.clone(),
            };
            output::print_outcome(&engine.create_folder(req).await)
        }
        FolderCommand::Update {
            id,
            name,
            parent,
            root,
        } => {
            let parent_id = if *root {
                Some(None)
            } else {
                parent.clone().map(Some)
            };
            let req = UpdateFolderRequest {
                folder_id: id.clone(),
                name: name.clone(),
                parent_id,
            };
            output::print_outcome(&engine.update_folder(req).await)
        }
        FolderCommand::Delete { id, recursive, yes } => {
            let req = DeleteFolderRequest {
                folder_id: id.clone(),
                recursive: *recursive,
                confirm: *yes,
            };
            output::print_outcome(&engine.delete_folder(req).await)
        }
    };

    engine.close().await;
    Ok(ok)
}
