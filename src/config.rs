//! Configuration System
//!
//! Layered configuration for the scaffold engine and its logging. Sources are
//! merged in order: defaults, global file, workspace `scaffold.toml`, then
//! `SCAFFOLD__*` environment variables. Tests included.

use crate::error::PipelineError;
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;

/// Name of the per-workspace config file.
pub const WORKSPACE_CONFIG_FILE: &str = "scaffold.toml";

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScaffoldConfig {
    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Engine settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Checkpoint file, relative to the workspace root unless absolute
    #[serde(default = "default_checkpoint_path")]
    pub checkpoint_path: PathBuf,

    /// Pipeline manifest, relative to the workspace root unless absolute
    #[serde(default = "default_manifest_path")]
    pub manifest_path: PathBuf,

    /// Roll completed steps back when a run fails
    #[serde(default)]
    pub rollback_on_failure: bool,
}

pub(crate) fn default_checkpoint_path() -> PathBuf {
    PathBuf::from(".scaffold/checkpoint.json")
}

pub(crate) fn default_manifest_path() -> PathBuf {
    PathBuf::from("scaffold.manifest.toml")
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            checkpoint_path: default_checkpoint_path(),
            manifest_path: default_manifest_path(),
            rollback_on_failure: false,
        }
    }
}

fn resolve_against(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.checkpoint_path.as_os_str().is_empty() {
            return Err("Checkpoint path cannot be empty".to_string());
        }
        if self.manifest_path.as_os_str().is_empty() {
            return Err("Manifest path cannot be empty".to_string());
        }
        Ok(())
    }

    pub fn resolve_checkpoint_path(&self, workspace_root: &Path) -> PathBuf {
        resolve_against(workspace_root, &self.checkpoint_path)
    }

    pub fn resolve_manifest_path(&self, workspace_root: &Path) -> PathBuf {
        resolve_against(workspace_root, &self.manifest_path)
    }
}

impl ScaffoldConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), PipelineError> {
        self.engine
            .validate()
            .map_err(|e| PipelineError::Config(format!("engine: {}", e)))?;
        match self.logging.format.as_str() {
            "text" | "json" => Ok(()),
            other => Err(PipelineError::Config(format!(
                "logging: invalid format '{}' (must be 'text' or 'json')",
                other
            ))),
        }
    }
}
