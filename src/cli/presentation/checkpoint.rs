//! Checkpoint formatters.

use super::shared::{format_section_heading, to_pretty_json};
use crate::engine::Checkpoint;
use crate::error::PipelineError;
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use std::path::Path;

pub fn format_checkpoint_json(
    path: &Path,
    checkpoint: Option<&Checkpoint>,
) -> Result<String, PipelineError> {
    to_pretty_json(&serde_json::json!({
        "path": path.display().to_string(),
        "checkpoint": checkpoint,
    }))
}

pub fn format_checkpoint_text(path: &Path, checkpoint: Option<&Checkpoint>) -> String {
    let Some(checkpoint) = checkpoint else {
        return format!("No checkpoint at {}", path.display());
    };

    let mut out = format!("{}\n\n", format_section_heading("Checkpoint"));
    out.push_str(&format!("  Path: {}\n", path.display()));
    out.push_str(&format!("  Saved: {}\n", checkpoint.timestamp.to_rfc3339()));
    out.push_str(&format!(
        "  Executed steps: {}\n",
        if checkpoint.executed_steps.is_empty() {
            "-".to_string()
        } else {
            checkpoint.executed_steps.join(", ")
        }
    ));

    if !checkpoint.state.is_empty() {
        let mut table = Table::new();
        table.load_preset(UTF8_BORDERS_ONLY);
        table.set_header(vec!["Key", "Value"]);
        for (key, value) in &checkpoint.state {
            table.add_row(vec![key.clone(), value.to_string()]);
        }
        out.push_str(&format!("\n{}\n", table));
    }
    out
}
