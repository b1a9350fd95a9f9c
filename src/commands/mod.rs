//! CLI command definitions and dispatch.

pub mod backup;
pub mod folder;
pub mod init;
pub mod prompt;

use clap::{Parser, Subcommand};

use promptdesk_core::config::AppConfig;
use promptdesk_core::result::AppResult;
use promptdesk_service::PromptEngine;

use crate::output::OutputFormat;

/// PromptDesk: consistent writes to a prompt library shared with its host app
#[derive(Debug, Parser)]
#[command(name = "promptdesk", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/promptdesk.toml")]
    pub config: String,

    /// Output format for listings
    #[arg(short, long, value_enum, default_value = "json")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create a development store with the fixture schema
    Init,
    /// Folder management
    Folder(folder::FolderArgs),
    /// Prompt management
    Prompt(prompt::PromptArgs),
    /// Backup export and restore
    Backup(backup::BackupArgs),
}

impl Cli {
    /// Execute the CLI command. `Ok(false)` means the operation was
    /// rejected and its outcome has already been printed.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<bool> {
        match &self.command {
            Commands::Init => init::execute(config).await,
            Commands::Folder(args) => folder::execute(args, config, self.format).await,
            Commands::Prompt(args) => prompt::execute(args, config, self.format).await,
            Commands::Backup(args) => backup::execute(args, config).await,
        }
    }
}

/// Helper: open the engine, read-only when the command does not write.
pub async fn open_engine(config: &AppConfig, writes: bool) -> AppResult<PromptEngine> {
    if writes {
        PromptEngine::open(config).await
    } else {
        PromptEngine::open_read_only(config).await
    }
}
