//! Run, steps, dry-run, and rollback formatters.

use super::shared::{format_section_heading, to_pretty_json};
use crate::engine::{DryRunReport, RollbackReport, RunSummary};
use crate::error::PipelineError;
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;
use serde::Serialize;

/// One row of `scaffold steps`.
#[derive(Debug, Clone, Serialize)]
pub struct StepListing {
    pub name: String,
    pub description: String,
    /// "plugin" or "manifest"
    pub source: String,
    pub has_rollback: bool,
}

pub fn format_steps(steps: &[StepListing], format: &str) -> Result<String, PipelineError> {
    if format == "json" {
        return to_pretty_json(&serde_json::json!({ "steps": steps, "total": steps.len() }));
    }
    if steps.is_empty() {
        return Ok("No steps defined.".to_string());
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["#", "Step", "Source", "Rollback", "Description"]);
    for (index, step) in steps.iter().enumerate() {
        table.add_row(vec![
            (index + 1).to_string(),
            step.name.clone(),
            step.source.clone(),
            if step.has_rollback { "yes" } else { "no" }.to_string(),
            step.description.clone(),
        ]);
    }
    Ok(format!("{}\n\n{}", format_section_heading("Pipeline"), table))
}

pub fn format_run_summary(summary: &RunSummary, format: &str) -> Result<String, PipelineError> {
    if format == "json" {
        return to_pretty_json(summary);
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Step", "Result"]);
    for name in &summary.executed {
        table.add_row(vec![name.clone(), format!("{}", "done".green())]);
    }
    for name in &summary.skipped {
        table.add_row(vec![name.clone(), format!("{}", "skipped".yellow())]);
    }
    for name in &summary.failed {
        table.add_row(vec![name.clone(), format!("{}", "failed".red())]);
    }
    Ok(format!(
        "{}\n\n{}\n\nExecuted: {}  Skipped: {}  Failed: {}",
        format_section_heading("Run"),
        table,
        summary.executed.len(),
        summary.skipped.len(),
        summary.failed.len()
    ))
}

pub fn format_dry_run_report(report: &DryRunReport, format: &str) -> Result<String, PipelineError> {
    if format == "json" {
        return to_pretty_json(report);
    }
    Ok(report.render())
}

pub fn format_rollback_report(report: &RollbackReport) -> String {
    if report.rolled_back.is_empty() && report.failures.is_empty() {
        return "Nothing to roll back.".to_string();
    }
    let mut out = format!("{}\n", format_section_heading("Rollback"));
    for name in &report.rolled_back {
        out.push_str(&format!("\n  {} {}", "undone".green(), name));
    }
    for (name, error) in &report.failures {
        out.push_str(&format!("\n  {} {}: {}", "failed".red(), name, error));
    }
    out
}
