//! CLI parse: clap types for Scaffold. No behavior; definitions only.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Scaffold CLI - Checkpointed generation pipelines
#[derive(Parser)]
#[command(name = "scaffold")]
#[command(about = "Run generation pipelines with checkpoints, rollback, and dry runs")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory
    #[arg(long, global = true, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long, global = true, default_value = "false")]
    pub verbose: bool,

    /// Disable logging entirely
    #[arg(long, global = true, default_value = "false")]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long, global = true)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long, global = true)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the manifest pipeline
    Run {
        /// Manifest path (default: engine.manifest_path)
        #[arg(long)]
        manifest: Option<PathBuf>,
        /// Start at the first step with this name
        #[arg(long, conflicts_with = "resume")]
        start_at: Option<String>,
        /// Continue after the last checkpointed step
        #[arg(long, conflicts_with = "dry_run")]
        resume: bool,
        /// Record intended actions without performing them
        #[arg(long)]
        dry_run: bool,
        /// Checkpoint path (default: engine.checkpoint_path)
        #[arg(long)]
        checkpoint: Option<PathBuf>,
        /// Roll completed steps back if a step fails
        #[arg(long)]
        rollback_on_failure: bool,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// List the effective pipeline steps in run order
    Steps {
        /// Manifest path (default: engine.manifest_path)
        #[arg(long)]
        manifest: Option<PathBuf>,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Inspect or clear the checkpoint
    Checkpoint {
        #[command(subcommand)]
        command: CheckpointCommands,
    },
    /// Undo the steps recorded in the checkpoint, latest first
    Rollback {
        /// Manifest path (default: engine.manifest_path)
        #[arg(long)]
        manifest: Option<PathBuf>,
        /// Checkpoint path (default: engine.checkpoint_path)
        #[arg(long)]
        checkpoint: Option<PathBuf>,
        /// Skip the confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub enum CheckpointCommands {
    /// Show executed steps and saved state
    Show {
        /// Checkpoint path (default: engine.checkpoint_path)
        #[arg(long)]
        checkpoint: Option<PathBuf>,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Delete the checkpoint file
    Clear {
        /// Checkpoint path (default: engine.checkpoint_path)
        #[arg(long)]
        checkpoint: Option<PathBuf>,
    },
}
