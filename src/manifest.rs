//! Pipeline manifests: TOML-declared generic file-system and command steps.
//!
//! ```toml
//! [[steps]]
//! name = "root"
//! description = "Create workspace root"
//! action = "create_dir"
//! path = "acme"
//!
//! [[steps]]
//! name = "git"
//! action = "command"
//! program = "git"
//! args = ["init"]
//! cwd = "acme"
//! skip_if_exists = "acme/.git"
//! ```
//!
//! Relative paths resolve against the workspace root.

use crate::engine::context::ExecutionContext;
use crate::engine::dry_run::{ActionKind, DryRunAction};
use crate::engine::step::{SharedStep, Step};
use crate::error::PipelineError;
use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineManifest {
    #[serde(default)]
    pub steps: Vec<ManifestStepConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestStepConfig {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(flatten)]
    pub action: ManifestAction,
    /// Skip the step when this path already exists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_if_exists: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ManifestAction {
    CreateDir {
        path: PathBuf,
    },
    WriteFile {
        path: PathBuf,
        content: String,
    },
    RemovePath {
        path: PathBuf,
    },
    Command {
        program: String,
        #[serde(default)]
        args: Vec<String>,
        #[serde(default)]
        cwd: Option<PathBuf>,
    },
}

impl PipelineManifest {
    pub fn from_toml(raw: &str) -> Result<Self, PipelineError> {
        let manifest: PipelineManifest =
            toml::from_str(raw).map_err(|e| PipelineError::Manifest(e.to_string()))?;
        manifest.validate()?;
        Ok(manifest)
    }

    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            PipelineError::Manifest(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&raw)
    }

    /// Reject steps that could never run. Duplicate names are allowed.
    pub fn validate(&self) -> Result<(), PipelineError> {
        for (index, step) in self.steps.iter().enumerate() {
            if step.name.trim().is_empty() {
                return Err(PipelineError::Manifest(format!(
                    "Step #{} has an empty name",
                    index + 1
                )));
            }
            let empty_path = match &step.action {
                ManifestAction::CreateDir { path }
                | ManifestAction::WriteFile { path, .. }
                | ManifestAction::RemovePath { path } => path.as_os_str().is_empty(),
                ManifestAction::Command { program, .. } => {
                    if program.trim().is_empty() {
                        return Err(PipelineError::Manifest(format!(
                            "Step '{}' has an empty program",
                            step.name
                        )));
                    }
                    false
                }
            };
            if empty_path {
                return Err(PipelineError::Manifest(format!(
                    "Step '{}' has an empty path",
                    step.name
                )));
            }
        }
        Ok(())
    }

    pub fn into_steps(self, root: &Path) -> Vec<SharedStep> {
        self.steps
            .into_iter()
            .map(|config| Arc::new(ManifestStep::new(config, root)) as SharedStep)
            .collect()
    }
}

/// A manifest entry bound to a workspace root.
#[derive(Debug, Clone)]
pub struct ManifestStep {
    config: ManifestStepConfig,
    root: PathBuf,
}

impl ManifestStep {
    pub fn new(config: ManifestStepConfig, root: &Path) -> Self {
        Self {
            config,
            root: root.to_path_buf(),
        }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    /// State key remembering whether `target` existed before the step ran.
    fn existed_key(&self, target: &Path) -> String {
        format!("manifest.{}.existed:{}", self.config.name, target.display())
    }

    fn created_by_step(&self, ctx: &ExecutionContext, target: &Path) -> bool {
        ctx.state.get_bool(&self.existed_key(target)) == Some(false)
    }

    fn command_line(program: &str, args: &[String]) -> String {
        std::iter::once(program.to_string())
            .chain(args.iter().cloned())
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn intended_action(&self) -> DryRunAction {
        let description = self.config.description.clone();
        match &self.config.action {
            ManifestAction::CreateDir { path } => {
                let path = self.resolve(path);
                DryRunAction::new(ActionKind::Create, path.display().to_string(), description)
            }
            ManifestAction::WriteFile { path, content } => {
                let path = self.resolve(path);
                let kind = if path.exists() {
                    ActionKind::Modify
                } else {
                    ActionKind::Create
                };
                DryRunAction::new(kind, path.display().to_string(), description)
                    .with_content(content.clone())
            }
            ManifestAction::RemovePath { path } => DryRunAction::new(
                ActionKind::Delete,
                self.resolve(path).display().to_string(),
                description,
            ),
            ManifestAction::Command { program, args, .. } => DryRunAction::new(
                ActionKind::Command,
                Self::command_line(program, args),
                description,
            ),
        }
    }

    async fn perform(&self, ctx: &mut ExecutionContext) -> anyhow::Result<()> {
        match &self.config.action {
            ManifestAction::CreateDir { path } => {
                let path = self.resolve(path);
                ctx.state.insert(self.existed_key(&path), path.exists());
                tokio::fs::create_dir_all(&path)
                    .await
                    .with_context(|| format!("Failed to create directory {}", path.display()))?;
            }
            ManifestAction::WriteFile { path, content } => {
                let path = self.resolve(path);
                ctx.state.insert(self.existed_key(&path), path.exists());
                if let Some(parent) = path.parent() {
                    tokio::fs::create_dir_all(parent).await.with_context(|| {
                        format!("Failed to create directory {}", parent.display())
                    })?;
                }
                tokio::fs::write(&path, content)
                    .await
                    .with_context(|| format!("Failed to write {}", path.display()))?;
            }
            ManifestAction::RemovePath { path } => {
                let path = self.resolve(path);
                let removed = if path.is_dir() {
                    tokio::fs::remove_dir_all(&path).await
                } else if path.exists() {
                    tokio::fs::remove_file(&path).await
                } else {
                    Ok(())
                };
                removed.with_context(|| format!("Failed to remove {}", path.display()))?;
            }
            ManifestAction::Command { program, args, cwd } => {
                let cwd = cwd
                    .as_deref()
                    .map(|dir| self.resolve(dir))
                    .unwrap_or_else(|| self.root.clone());
                let line = Self::command_line(program, args);
                debug!(step = %self.config.name, command = %line, cwd = %cwd.display(), "Running command");
                let status = tokio::process::Command::new(program)
                    .args(args)
                    .current_dir(&cwd)
                    .status()
                    .await
                    .with_context(|| format!("Failed to spawn `{}`", line))?;
                if !status.success() {
                    anyhow::bail!("`{}` exited with {}", line, status);
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Step for ManifestStep {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn description(&self) -> &str {
        &self.config.description
    }

    async fn execute(&self, ctx: &mut ExecutionContext) -> anyhow::Result<()> {
        if ctx.is_dry_run() {
            ctx.record(self.intended_action());
            return Ok(());
        }
        self.perform(ctx).await
    }

    fn has_rollback(&self) -> bool {
        matches!(
            self.config.action,
            ManifestAction::CreateDir { .. } | ManifestAction::WriteFile { .. }
        )
    }

    /// Removes what the step created. Targets that existed beforehand, or
    /// whose prior existence is unknown, are left in place.
    async fn rollback(&self, ctx: &mut ExecutionContext) -> anyhow::Result<()> {
        match &self.config.action {
            ManifestAction::CreateDir { path } => {
                let path = self.resolve(path);
                if self.created_by_step(ctx, &path) && path.is_dir() {
                    tokio::fs::remove_dir_all(&path)
                        .await
                        .with_context(|| format!("Failed to remove {}", path.display()))?;
                }
            }
            ManifestAction::WriteFile { path, .. } => {
                let path = self.resolve(path);
                if self.created_by_step(ctx, &path) && path.exists() {
                    tokio::fs::remove_file(&path)
                        .await
                        .with_context(|| format!("Failed to remove {}", path.display()))?;
                }
            }
            ManifestAction::RemovePath { .. } | ManifestAction::Command { .. } => {}
        }
        Ok(())
    }

    fn should_skip(&self, _ctx: &ExecutionContext) -> bool {
        self.config
            .skip_if_exists
            .as_deref()
            .map(|path| self.resolve(path).exists())
            .unwrap_or(false)
    }
}
