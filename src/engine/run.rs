//! The pipeline algorithm shared by the real and simulating runners.
//!
//! One loop, parameterized by the context's effect policy:
//! - `Perform`: a failing step fires `OnError` and ends the run; each
//!   completed step is checkpointed.
//! - `Record`: a failing step fires `OnError`, is logged, and the loop
//!   continues; nothing is persisted.

use crate::engine::checkpoint::CheckpointStore;
use crate::engine::context::ExecutionContext;
use crate::engine::messages::{MessageKey, Messages};
use crate::engine::pipeline::Pipeline;
use crate::engine::step::SharedStep;
use crate::error::PipelineError;
use crate::plugin::{Hook, PluginRegistry};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    NotStarted,
    Running,
    Completed,
    Failed,
}

/// Outcome of one pass through the step loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub status: RunStatus,
    /// Steps that completed in this run, in order.
    pub executed: Vec<String>,
    pub skipped: Vec<String>,
    /// Steps that failed. Only a simulating run can list more than one.
    pub failed: Vec<String>,
}

impl RunSummary {
    fn running() -> Self {
        Self {
            status: RunStatus::Running,
            executed: Vec::new(),
            skipped: Vec::new(),
            failed: Vec::new(),
        }
    }
}

/// A completed step as the executor remembers it.
///
/// `step` is `None` for names seeded from a checkpoint that no longer match
/// any step of the pipeline.
#[derive(Clone)]
pub(crate) struct CompletedStep {
    pub name: String,
    pub step: Option<SharedStep>,
}

pub(crate) fn completed_names(completed: &[CompletedStep]) -> Vec<String> {
    completed.iter().map(|c| c.name.clone()).collect()
}

/// A strategy for running a composed pipeline.
#[async_trait]
pub trait Runner: Send {
    /// Effective step names in run order.
    fn step_names(&self) -> Vec<String>;

    async fn run(
        &mut self,
        ctx: &mut ExecutionContext,
        start_at: Option<&str>,
    ) -> Result<RunSummary, PipelineError>;
}

/// Index to start from: 0 without `start_at`, else the first step so named.
pub(crate) fn resolve_start(
    pipeline: &Pipeline,
    start_at: Option<&str>,
    messages: &dyn Messages,
) -> Result<usize, PipelineError> {
    let Some(name) = start_at else {
        return Ok(0);
    };
    pipeline.position(name).ok_or_else(|| {
        error!(step = name, "{}", messages.text(MessageKey::InvalidStartStep, name));
        PipelineError::InvalidStartStep(name.to_string())
    })
}

/// Run `steps` in order against `ctx`.
///
/// `executed` holds the steps completed so far (possibly seeded by a
/// resume); every newly completed step is appended and, when `checkpoints`
/// is set, the whole list of names is persisted together with the current
/// state.
pub(crate) async fn run_pipeline(
    steps: &[SharedStep],
    ctx: &mut ExecutionContext,
    registry: &PluginRegistry,
    checkpoints: Option<&CheckpointStore>,
    executed: &mut Vec<CompletedStep>,
    messages: &dyn Messages,
) -> Result<RunSummary, PipelineError> {
    let simulate = ctx.is_dry_run();
    let mut summary = RunSummary::running();

    info!(
        steps = steps.len(),
        dry_run = simulate,
        "{}",
        messages.text(MessageKey::RunStarted, &steps.len().to_string())
    );
    registry.invoke(&Hook::BeforeGeneration, ctx).await;

    for step in steps {
        let name = step.name();

        if step.should_skip(ctx) {
            info!(step = name, "{}", messages.text(MessageKey::StepSkipped, name));
            summary.skipped.push(name.to_string());
            continue;
        }

        registry.invoke(&Hook::BeforeStep { step: name }, ctx).await;
        debug!(
            step = name,
            description = step.description(),
            "{}",
            messages.text(MessageKey::StepStarted, name)
        );

        match step.execute(ctx).await {
            Ok(()) => {
                executed.push(CompletedStep {
                    name: name.to_string(),
                    step: Some(step.clone()),
                });
                summary.executed.push(name.to_string());
                if let Some(store) = checkpoints {
                    store.save(&completed_names(executed), &ctx.state)?;
                    debug!(
                        step = name,
                        checkpoint = %store.path().display(),
                        executed = executed.len(),
                        "{}",
                        messages.text(
                            MessageKey::CheckpointSaved,
                            &store.path().display().to_string()
                        )
                    );
                }
                info!(step = name, "{}", messages.text(MessageKey::StepCompleted, name));
                registry.invoke(&Hook::AfterStep { step: name }, ctx).await;
            }
            Err(err) => {
                registry
                    .invoke(
                        &Hook::OnError {
                            step: name,
                            error: &err,
                        },
                        ctx,
                    )
                    .await;
                if simulate {
                    warn!(
                        step = name,
                        error = %err,
                        "{}",
                        messages.text(MessageKey::DryRunStepFailed, name)
                    );
                    summary.failed.push(name.to_string());
                    continue;
                }
                error!(step = name, error = %err, "{}", messages.text(MessageKey::StepFailed, name));
                return Err(PipelineError::StepFailed {
                    step: name.to_string(),
                    source: err,
                });
            }
        }
    }

    registry.invoke(&Hook::AfterGeneration, ctx).await;
    summary.status = RunStatus::Completed;
    info!(
        executed = summary.executed.len(),
        skipped = summary.skipped.len(),
        "{}",
        messages.text(MessageKey::RunCompleted, "")
    );
    Ok(summary)
}
