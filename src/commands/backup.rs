//! Backup export and restore CLI commands.

use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};

use promptdesk_core::config::AppConfig;
use promptdesk_core::error::AppError;
use promptdesk_core::result::AppResult;
use promptdesk_core::types::OperationOutcome;
use promptdesk_entity::backup::BackupSnapshot;

use crate::output;

/// Arguments for backup commands
#[derive(Debug, Args)]
pub struct BackupArgs {
    /// Backup subcommand
    #[command(subcommand)]
    pub command: BackupCommand,
}

/// Backup subcommands
#[derive(Debug, Subcommand)]
pub enum BackupCommand {
    /// Write every folder and prompt to a snapshot file
    Export {
        /// Destination file
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Replay a snapshot file into the store
    Restore {
        /// Snapshot file
        #[arg(short, long)]
        input: PathBuf,
        /// Replace entities that already exist instead of skipping them
        #[arg(long)]
        overwrite: bool,
    },
}

/// Execute backup commands
pub async fn execute(args: &BackupArgs, config: &AppConfig) -> AppResult<bool> {
    match &args.command {
        BackupCommand::Export { output: path } => {
            let engine = match super::open_engine(config, false).await {
                Ok(engine) => engine,
                Err(e) => return Ok(output::print_rejection(&e)),
            };
            let result = engine.snapshot().await;
            engine.close().await;

            let outcome = match result.and_then(|snapshot| write_snapshot(path, &snapshot)) {
                Ok(snapshot) => OperationOutcome::success(
                    None,
                    format!(
                        "Exported {} folder(s) and {} prompt(s) to '{}'",
                        snapshot.folders.len(),
                        snapshot.prompts.len(),
                        path.display()
                    ),
                ),
                Err(e) => OperationOutcome::from_error(&e),
            };
            Ok(output::print_outcome(&outcome))
        }
        BackupCommand::Restore { input, overwrite } => {
            let snapshot = match read_snapshot(input) {
                Ok(snapshot) => snapshot,
                Err(e) => return Ok(output::print_rejection(&e)),
            };
            let engine = match super::open_engine(config, true).await {
                Ok(engine) => engine,
                Err(e) => return Ok(output::print_rejection(&e)),
            };
            let outcome = engine.restore_backup(&snapshot, *overwrite).await;
            engine.close().await;
            Ok(output::print_outcome(&outcome))
        }
    }
}

fn write_snapshot(path: &Path, snapshot: &BackupSnapshot) -> AppResult<BackupSnapshot> {
    let json = serde_json::to_string_pretty(snapshot)?;
    std::fs::write(path, json)?;
    Ok(snapshot.clone())
}

fn read_snapshot(path: &Path) -> AppResult<BackupSnapshot> {
    let raw = std::fs::read_to_string(path)?;
    serde_json::from_str(&raw).map_err(|e| {
        AppError::invalid_backup(format!("'{}' is not a snapshot file: {e}", path.display()))
    })
}
