//! Shared presentation helpers.

use crate::error::PipelineError;
use owo_colors::OwoColorize;
use serde::Serialize;

/// Format a section heading with bold/underline.
pub fn format_section_heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

pub(crate) fn to_pretty_json<T: Serialize>(value: &T) -> Result<String, PipelineError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| PipelineError::Config(format!("Failed to serialize output: {}", e)))
}
