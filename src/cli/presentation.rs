//! CLI presentation: text and json formatters per command family.

mod checkpoint;
mod run;
mod shared;

pub use checkpoint::{format_checkpoint_json, format_checkpoint_text};
pub use run::{
    format_dry_run_report, format_rollback_report, format_run_summary, format_steps,
    StepListing,
};
pub use shared::format_section_heading;
