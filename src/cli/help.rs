//! CLI help and command-name contract for logging and routing.

use crate::cli::parse::{CheckpointCommands, Commands};

/// Command name string for log fields (e.g. "run", "checkpoint.show").
pub fn command_name(command: &Commands) -> String {
    match command {
        Commands::Run { .. } => "run".to_string(),
        Commands::Steps { .. } => "steps".to_string(),
        Commands::Checkpoint { command } => {
            format!("checkpoint.{}", checkpoint_command_name(command))
        }
        Commands::Rollback { .. } => "rollback".to_string(),
    }
}

pub fn checkpoint_command_name(command: &CheckpointCommands) -> &'static str {
    match command {
        CheckpointCommands::Show { .. } => "show",
        CheckpointCommands::Clear { .. } => "clear",
    }
}
