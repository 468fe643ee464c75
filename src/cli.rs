//! CLI domain: parse, route, help, output, and presentation only.
//! No engine orchestration of its own; a single route table dispatches to the engine.

mod help;
mod output;
mod parse;
mod presentation;
mod route;

pub use help::{checkpoint_command_name, command_name};
pub use output::map_error;
pub use parse::{CheckpointCommands, Cli, Commands};
pub use presentation::{
    format_checkpoint_json, format_checkpoint_text, format_dry_run_report,
    format_rollback_report, format_run_summary, format_section_heading, format_steps,
    StepListing,
};
pub use route::RunContext;
