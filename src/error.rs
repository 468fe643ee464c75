//! Error types for the scaffold pipeline engine.

use std::path::PathBuf;
use thiserror::Error;

/// Checkpoint persistence errors
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("Checkpoint I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Checkpoint at {path} is not valid JSON: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize checkpoint: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Errors surfaced by pipeline runs and the surfaces around them
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Invalid start step: {0}")]
    InvalidStartStep(String),

    /// A step's `execute` failed. `source` is the step's own error, unchanged.
    #[error("Step '{step}' failed: {source}")]
    StepFailed {
        step: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),

    #[error("Manifest error: {0}")]
    Manifest(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl PipelineError {
    /// The failing step's original error, if this is a step failure.
    pub fn step_error(&self) -> Option<&anyhow::Error> {
        match self {
            PipelineError::StepFailed { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<config::ConfigError> for PipelineError {
    fn from(err: config::ConfigError) -> Self {
        PipelineError::Config(err.to_string())
    }
}
