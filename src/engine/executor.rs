//! Step executor: runs the composed pipeline for real, checkpointing after
//! every completed step, and rolls completed steps back on request.

use crate::engine::checkpoint::{CheckpointStore, RestoredCheckpoint};
use crate::engine::context::ExecutionContext;
use crate::engine::messages::{EnglishMessages, MessageKey, Messages};
use crate::engine::pipeline::{Pipeline, PipelineComposition};
use crate::engine::run::{
    completed_names, resolve_start, run_pipeline, CompletedStep, RunStatus, RunSummary, Runner,
};
use crate::engine::step::SharedStep;
use crate::error::{CheckpointError, PipelineError};
use crate::plugin::PluginRegistry;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Result of a best-effort rollback.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollbackReport {
    /// Steps whose rollback ran successfully, latest first.
    pub rolled_back: Vec<String>,
    /// `(step, error)` for rollbacks that failed.
    pub failures: Vec<(String, String)>,
}

impl RollbackReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct StepExecutor {
    composition: PipelineComposition,
    executed: Vec<CompletedStep>,
    status: RunStatus,
    messages: Arc<dyn Messages>,
}

impl Default for StepExecutor {
    fn default() -> Self {
        Self::new(Arc::new(PluginRegistry::new()))
    }
}

impl StepExecutor {
    pub fn new(registry: Arc<PluginRegistry>) -> Self {
        Self {
            composition: PipelineComposition::new(registry),
            executed: Vec::new(),
            status: RunStatus::NotStarted,
            messages: Arc::new(EnglishMessages),
        }
    }

    pub fn with_messages(mut self, messages: Arc<dyn Messages>) -> Self {
        self.messages = messages;
        self
    }

    /// Append an explicit step. Duplicate names are accepted.
    pub fn add_step(&mut self, step: SharedStep) -> &mut Self {
        self.composition.add_step(step);
        self
    }

    /// Effective step names in run order (plugin steps first).
    pub fn step_names(&self) -> Vec<String> {
        self.composition.step_names()
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    /// Names of steps completed by the current (or last) run, in order.
    pub fn executed_steps(&self) -> Vec<String> {
        completed_names(&self.executed)
    }

    /// Replace the executed list, e.g. with a checkpoint's, so a fresh
    /// process can roll back an earlier run. Call after every step is added:
    /// names are bound to steps of the current pipeline, repeated names to
    /// their successive occurrences.
    pub fn seed_executed(&mut self, executed: Vec<String>) {
        let pipeline = self.composition.effective();
        let resolved = pipeline.resolve_sequence(&executed);
        self.executed = bind_completed(&pipeline, executed, resolved);
    }

    /// Run the pipeline from the first step, or from the first step named
    /// `start_at`.
    ///
    /// An unknown `start_at` fails before any hook fires or step runs. A
    /// failing step fires `OnError` and its error is returned; the checkpoint
    /// then reflects the last completed step.
    pub async fn execute(
        &mut self,
        ctx: &mut ExecutionContext,
        start_at: Option<&str>,
    ) -> Result<RunSummary, PipelineError> {
        let pipeline = self.composition.effective();
        let start = resolve_start(&pipeline, start_at, self.messages.as_ref())?;
        self.executed.clear();
        self.run_from(ctx, &pipeline.steps()[start..]).await
    }

    /// Continue the run recorded in the checkpoint at `ctx.checkpoint_path`.
    ///
    /// The checkpoint's state is merged into `ctx`, its executed steps seed
    /// the executed list, and the run starts right after the pipeline step the
    /// last of them resolves to. Without a checkpoint this is a run from the
    /// first step.
    pub async fn resume(&mut self, ctx: &mut ExecutionContext) -> Result<RunSummary, PipelineError> {
        let restored = Self::restore_checkpoint(&ctx.checkpoint_path)?;
        let Some(last) = restored.last_step().map(str::to_string) else {
            return self.execute(ctx, None).await;
        };

        let pipeline = self.composition.effective();
        let resolved = pipeline.resolve_sequence(&restored.executed_steps);
        let start = resolved
            .last()
            .copied()
            .flatten()
            .map(|index| index + 1)
            .ok_or_else(|| PipelineError::InvalidStartStep(last.clone()))?;
        let executed = bind_completed(&pipeline, restored.executed_steps, resolved);

        info!(
            checkpoint = %ctx.checkpoint_path.display(),
            completed = executed.len(),
            "{}",
            self.messages.text(
                MessageKey::CheckpointRestored,
                &ctx.checkpoint_path.display().to_string()
            )
        );
        ctx.state.merge(&restored.state);
        self.executed = executed;
        self.run_from(ctx, &pipeline.steps()[start..]).await
    }

    /// Undo completed steps, latest first.
    ///
    /// Steps without a rollback are passed over. A failing rollback is logged
    /// and the walk continues with the next earlier step; this never fails.
    pub async fn rollback(&mut self, ctx: &mut ExecutionContext) -> RollbackReport {
        let mut report = RollbackReport::default();

        for CompletedStep { name, step } in self.executed.iter().rev() {
            let Some(step) = step else {
                warn!(
                    step = %name,
                    "{}",
                    self.messages.text(MessageKey::StepNotInPipeline, name)
                );
                continue;
            };
            if !step.has_rollback() {
                continue;
            }
            info!(step = %name, "{}", self.messages.text(MessageKey::RollbackStep, name));
            match step.rollback(ctx).await {
                Ok(()) => report.rolled_back.push(name.clone()),
                Err(err) => {
                    warn!(
                        step = %name,
                        error = %err,
                        "{}",
                        self.messages.text(MessageKey::RollbackFailed, name)
                    );
                    report.failures.push((name.clone(), err.to_string()));
                }
            }
        }

        self.executed.clear();
        report
    }

    /// Read the checkpoint at `path`; a missing file restores to empty.
    pub fn restore_checkpoint(path: &Path) -> Result<RestoredCheckpoint, CheckpointError> {
        CheckpointStore::new(path).restore()
    }

    async fn run_from(
        &mut self,
        ctx: &mut ExecutionContext,
        steps: &[SharedStep],
    ) -> Result<RunSummary, PipelineError> {
        let store = CheckpointStore::new(&ctx.checkpoint_path);
        self.status = RunStatus::Running;
        let outcome = run_pipeline(
            steps,
            ctx,
            self.composition.registry(),
            Some(&store),
            &mut self.executed,
            self.messages.as_ref(),
        )
        .await;
        self.status = match &outcome {
            Ok(_) => RunStatus::Completed,
            Err(_) => RunStatus::Failed,
        };
        outcome
    }
}

/// Pair executed names with the pipeline steps they resolved to.
fn bind_completed(
    pipeline: &Pipeline,
    names: Vec<String>,
    resolved: Vec<Option<usize>>,
) -> Vec<CompletedStep> {
    names
        .into_iter()
        .zip(resolved)
        .map(|(name, index)| CompletedStep {
            step: index.map(|i| pipeline.steps()[i].clone()),
            name,
        })
        .collect()
}

#[async_trait]
impl Runner for StepExecutor {
    fn step_names(&self) -> Vec<String> {
        self.composition.step_names()
    }

    async fn run(
        &mut self,
        ctx: &mut ExecutionContext,
        start_at: Option<&str>,
    ) -> Result<RunSummary, PipelineError> {
        self.execute(ctx, start_at).await
    }
}
