//! CLI route: single route table and run context. Dispatches to the engine and presentation.

use crate::cli::command_name;
use crate::cli::parse::{CheckpointCommands, Commands};
use crate::cli::presentation::{
    format_checkpoint_json, format_checkpoint_text, format_dry_run_report,
    format_rollback_report, format_run_summary, format_steps, StepListing,
};
use crate::config::{ConfigLoader, ScaffoldConfig};
use crate::engine::{
    CheckpointStore, DryRunExecutor, ExecutionContext, GenerationConfig, SharedStep, StepExecutor,
};
use crate::error::PipelineError;
use crate::manifest::PipelineManifest;
use crate::plugin::{PluginRegistry, TracingPlugin};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Runtime context for CLI execution: workspace, loaded config, and plugins.
pub struct RunContext {
    workspace_root: PathBuf,
    config: ScaffoldConfig,
    registry: Arc<PluginRegistry>,
}

impl RunContext {
    /// Create run context from workspace root and optional config path. Uses ConfigLoader only.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, PipelineError> {
        let config = if let Some(ref cfg_path) = config_path {
            ConfigLoader::load_from_file(cfg_path)?
        } else {
            ConfigLoader::load(&workspace_root)?
        };
        config.validate()?;

        let mut registry = PluginRegistry::new();
        registry.register(Arc::new(TracingPlugin::new()));

        Ok(Self {
            workspace_root,
            config,
            registry: Arc::new(registry),
        })
    }

    /// Replace the plugin registry, e.g. to embed the CLI with extra plugins.
    pub fn with_registry(mut self, registry: Arc<PluginRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn config(&self) -> &ScaffoldConfig {
        &self.config
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    /// Execute a CLI command via the single route table.
    pub async fn execute(&self, command: &Commands) -> Result<String, PipelineError> {
        let name = command_name(command);
        let started = Instant::now();
        info!(command = %name, "Executing command");
        let result = self.execute_inner(command).await;
        let duration_ms = started.elapsed().as_millis() as u64;
        match &result {
            Ok(_) => debug!(command = %name, duration_ms, "Command completed"),
            Err(e) => warn!(command = %name, duration_ms, error = %e, "Command failed"),
        }
        result
    }

    async fn execute_inner(&self, command: &Commands) -> Result<String, PipelineError> {
        match command {
            Commands::Run {
                manifest,
                start_at,
                resume,
                dry_run,
                checkpoint,
                rollback_on_failure,
                format,
            } => {
                let request = RunRequest {
                    manifest: self.manifest_path(manifest.as_deref()),
                    checkpoint: self.checkpoint_path(checkpoint.as_deref()),
                    start_at: start_at.clone(),
                    resume: *resume,
                    rollback_on_failure: *rollback_on_failure
                        || self.config.engine.rollback_on_failure,
                };
                if *dry_run {
                    self.handle_dry_run(&request, format).await
                } else {
                    self.handle_run(&request, format).await
                }
            }
            Commands::Steps { manifest, format } => {
                self.handle_steps(&self.manifest_path(manifest.as_deref()), format)
            }
            Commands::Checkpoint { command } => match command {
                CheckpointCommands::Show { checkpoint, format } => {
                    self.handle_checkpoint_show(&self.checkpoint_path(checkpoint.as_deref()), format)
                }
                CheckpointCommands::Clear { checkpoint } => {
                    self.handle_checkpoint_clear(&self.checkpoint_path(checkpoint.as_deref()))
                }
            },
            Commands::Rollback {
                manifest,
                checkpoint,
                yes,
            } => {
                self.handle_rollback(
                    &self.manifest_path(manifest.as_deref()),
                    &self.checkpoint_path(checkpoint.as_deref()),
                    *yes,
                )
                .await
            }
        }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.workspace_root.join(path)
        }
    }

    fn manifest_path(&self, flag: Option<&Path>) -> PathBuf {
        match flag {
            Some(path) => self.resolve(path),
            None => self.config.engine.resolve_manifest_path(&self.workspace_root),
        }
    }

    fn checkpoint_path(&self, flag: Option<&Path>) -> PathBuf {
        match flag {
            Some(path) => self.resolve(path),
            None => self.config.engine.resolve_checkpoint_path(&self.workspace_root),
        }
    }

    fn load_steps(&self, manifest_path: &Path) -> Result<Vec<SharedStep>, PipelineError> {
        let manifest = PipelineManifest::load(manifest_path)?;
        debug!(
            manifest = %manifest_path.display(),
            steps = manifest.steps.len(),
            "Loaded pipeline manifest"
        );
        Ok(manifest.into_steps(&self.workspace_root))
    }

    fn generation_config(&self, manifest_path: &Path) -> GenerationConfig {
        GenerationConfig::new(json!({
            "workspaceRoot": self.workspace_root.display().to_string(),
            "manifestPath": manifest_path.display().to_string(),
        }))
    }

    async fn handle_run(&self, request: &RunRequest, format: &str) -> Result<String, PipelineError> {
        let mut executor = StepExecutor::new(Arc::clone(&self.registry));
        for step in self.load_steps(&request.manifest)? {
            executor.add_step(step);
        }
        let mut ctx =
            ExecutionContext::new(self.generation_config(&request.manifest), &request.checkpoint);

        let outcome = if request.resume {
            executor.resume(&mut ctx).await
        } else {
            executor.execute(&mut ctx, request.start_at.as_deref()).await
        };

        match outcome {
            Ok(summary) => format_run_summary(&summary, format),
            Err(err @ PipelineError::StepFailed { .. }) if request.rollback_on_failure => {
                let report = executor.rollback(&mut ctx).await;
                warn!(
                    rolled_back = report.rolled_back.len(),
                    failures = report.failures.len(),
                    "Rolled back completed steps after failure"
                );
                if report.is_clean() {
                    CheckpointStore::new(&request.checkpoint).clear()?;
                }
                eprintln!("{}", format_rollback_report(&report));
                Err(err)
            }
            Err(err) => Err(err),
        }
    }

    async fn handle_dry_run(&self, request: &RunRequest, format: &str) -> Result<String, PipelineError> {
        let mut executor = DryRunExecutor::new(Arc::clone(&self.registry));
        for step in self.load_steps(&request.manifest)? {
            executor.add_step(step);
        }
        let ctx = ExecutionContext::new(self.generation_config(&request.manifest), &request.checkpoint);
        let report = executor.execute(&ctx, request.start_at.as_deref()).await;
        format_dry_run_report(&report, format)
    }

    fn handle_steps(&self, manifest_path: &Path, format: &str) -> Result<String, PipelineError> {
        let plugin_steps = self.registry.steps().into_iter().map(|s| (s, "plugin"));
        let manifest_steps = self
            .load_steps(manifest_path)?
            .into_iter()
            .map(|s| (s, "manifest"));
        let listing: Vec<StepListing> = plugin_steps
            .chain(manifest_steps)
            .map(|(step, source)| StepListing {
                name: step.name().to_string(),
                description: step.description().to_string(),
                source: source.to_string(),
                has_rollback: step.has_rollback(),
            })
            .collect();
        format_steps(&listing, format)
    }

    fn handle_checkpoint_show(&self, path: &Path, format: &str) -> Result<String, PipelineError> {
        let checkpoint = CheckpointStore::new(path).load()?;
        if format == "json" {
            format_checkpoint_json(path, checkpoint.as_ref())
        } else {
            Ok(format_checkpoint_text(path, checkpoint.as_ref()))
        }
    }

    fn handle_checkpoint_clear(&self, path: &Path) -> Result<String, PipelineError> {
        if CheckpointStore::new(path).clear()? {
            Ok(format!("Checkpoint cleared: {}", path.display()))
        } else {
            Ok(format!("No checkpoint at {}", path.display()))
        }
    }

    async fn handle_rollback(
        &self,
        manifest_path: &Path,
        checkpoint_path: &Path,
        yes: bool,
    ) -> Result<String, PipelineError> {
        let store = CheckpointStore::new(checkpoint_path);
        let restored = store.restore()?;
        if restored.executed_steps.is_empty() {
            return Ok("Nothing to roll back.".to_string());
        }

        if !yes {
            use dialoguer::Confirm;
            let confirmed = Confirm::new()
                .with_prompt(format!(
                    "Roll back {} completed step(s)?",
                    restored.executed_steps.len()
                ))
                .default(false)
                .interact()
                .map_err(|e| PipelineError::Config(format!("Failed to get user input: {}", e)))?;

            if !confirmed {
                return Ok("Rollback cancelled".to_string());
            }
        }

        let mut executor = StepExecutor::new(Arc::clone(&self.registry));
        for step in self.load_steps(manifest_path)? {
            executor.add_step(step);
        }
        executor.seed_executed(restored.executed_steps);
        let mut ctx = ExecutionContext::new(self.generation_config(manifest_path), checkpoint_path)
            .with_state(restored.state);

        let report = executor.rollback(&mut ctx).await;
        if report.is_clean() {
            store.clear()?;
        }
        Ok(format_rollback_report(&report))
    }
}

struct RunRequest {
    manifest: PathBuf,
    checkpoint: PathBuf,
    start_at: Option<String>,
    resume: bool,
    rollback_on_failure: bool,
}
