//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::PipelineError;

/// Map domain errors to a string for CLI output, including the step error's
/// cause chain.
pub fn map_error(e: &PipelineError) -> String {
    match e.step_error() {
        Some(source) => {
            let causes: Vec<String> = source.chain().skip(1).map(|c| c.to_string()).collect();
            if causes.is_empty() {
                e.to_string()
            } else {
                format!("{}\n  caused by: {}", e, causes.join("\n  caused by: "))
            }
        }
        None => e.to_string(),
    }
}
