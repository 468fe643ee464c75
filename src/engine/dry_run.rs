//! Dry-run executor: runs the pipeline against a simulating context,
//! recording what steps would do instead of letting them do it.

use crate::engine::context::ExecutionContext;
use crate::engine::messages::{EnglishMessages, MessageKey, Messages};
use crate::engine::pipeline::PipelineComposition;
use crate::engine::run::{resolve_start, run_pipeline, RunStatus, RunSummary, Runner};
use crate::engine::step::SharedStep;
use crate::error::PipelineError;
use crate::plugin::PluginRegistry;
use async_trait::async_trait;
use comfy_table::presets::UTF8_FULL;
use comfy_table::Table;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Create,
    Modify,
    Delete,
    Command,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ActionKind::Create => "create",
            ActionKind::Modify => "modify",
            ActionKind::Delete => "delete",
            ActionKind::Command => "command",
        };
        f.write_str(label)
    }
}

/// One side effect a step would have performed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DryRunAction {
    #[serde(rename = "type")]
    pub kind: ActionKind,
    /// Affected path or command line.
    pub target: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl DryRunAction {
    pub fn new(kind: ActionKind, target: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            kind,
            target: target.into(),
            description: description.into(),
            content: None,
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }
}

/// Append-only action log shared between a dry-run executor and its context.
#[derive(Debug, Clone, Default)]
pub struct ActionLog {
    actions: Arc<Mutex<Vec<DryRunAction>>>,
}

impl ActionLog {
    pub fn push(&self, action: DryRunAction) {
        self.actions.lock().push(action);
    }

    pub fn snapshot(&self) -> Vec<DryRunAction> {
        self.actions.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.actions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.lock().is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DryRunSummary {
    pub files_created: usize,
    pub files_modified: usize,
    pub files_deleted: usize,
    pub commands_executed: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DryRunReport {
    pub actions: Vec<DryRunAction>,
    pub summary: DryRunSummary,
}

impl DryRunReport {
    /// Build a report; the summary is always recomputed from `actions`.
    pub fn from_actions(actions: Vec<DryRunAction>) -> Self {
        let mut summary = DryRunSummary::default();
        for action in &actions {
            match action.kind {
                ActionKind::Create => summary.files_created += 1,
                ActionKind::Modify => summary.files_modified += 1,
                ActionKind::Delete => summary.files_deleted += 1,
                ActionKind::Command => summary.commands_executed += 1,
            }
        }
        Self { actions, summary }
    }

    /// Format the report for a terminal. Pure: nothing is printed.
    pub fn render(&self) -> String {
        let mut out = String::from("Dry run: no changes were made.\n");
        if self.actions.is_empty() {
            out.push_str("\nNo actions recorded.\n");
        } else {
            let mut table = Table::new();
            table.load_preset(UTF8_FULL);
            table.set_header(vec!["#", "Type", "Target", "Description"]);
            for (index, action) in self.actions.iter().enumerate() {
                table.add_row(vec![
                    (index + 1).to_string(),
                    action.kind.to_string(),
                    action.target.clone(),
                    action.description.clone(),
                ]);
            }
            out.push('\n');
            out.push_str(&table.to_string());
            out.push('\n');
        }
        out.push_str(&format!(
            "\nSummary:\n  Files created:     {}\n  Files modified:    {}\n  Files deleted:     {}\n  Commands executed: {}",
            self.summary.files_created,
            self.summary.files_modified,
            self.summary.files_deleted,
            self.summary.commands_executed
        ));
        out
    }
}

/// Simulating executor.
///
/// Each `execute` derives a new context from the caller's (which stays
/// untouched), marks it as recording, and runs the shared algorithm. Step
/// failures are logged and the simulation moves on to the next step; no
/// checkpoint is ever written.
pub struct DryRunExecutor {
    composition: PipelineComposition,
    log: ActionLog,
    last_summary: Option<RunSummary>,
    messages: Arc<dyn Messages>,
}

impl Default for DryRunExecutor {
    fn default() -> Self {
        Self::new(Arc::new(PluginRegistry::new()))
    }
}

impl DryRunExecutor {
    pub fn new(registry: Arc<PluginRegistry>) -> Self {
        Self {
            composition: PipelineComposition::new(registry),
            log: ActionLog::default(),
            last_summary: None,
            messages: Arc::new(EnglishMessages),
        }
    }

    pub fn with_messages(mut self, messages: Arc<dyn Messages>) -> Self {
        self.messages = messages;
        self
    }

    pub fn add_step(&mut self, step: SharedStep) -> &mut Self {
        self.composition.add_step(step);
        self
    }

    pub fn step_names(&self) -> Vec<String> {
        self.composition.step_names()
    }

    /// Record an action directly into the current log.
    pub fn record_action(&self, action: DryRunAction) {
        self.log.push(action);
    }

    /// Summary of the most recent simulation, if one ran to the step loop.
    pub fn last_summary(&self) -> Option<&RunSummary> {
        self.last_summary.as_ref()
    }

    /// Simulate the pipeline and return the resulting report.
    ///
    /// Never fails: any error (including an unknown `start_at`) is logged and
    /// the report holds whatever was recorded up to that point.
    pub async fn execute(&mut self, ctx: &ExecutionContext, start_at: Option<&str>) -> DryRunReport {
        self.log = ActionLog::default();
        self.last_summary = None;
        let mut sim_ctx = ctx.derive_dry_run(self.log.clone());

        match self.simulate(&mut sim_ctx, start_at).await {
            Ok(summary) => self.last_summary = Some(summary),
            Err(err) => {
                warn!(error = %err, "{}", self.messages.text(MessageKey::DryRunAborted, ""));
            }
        }
        self.get_report()
    }

    pub fn get_report(&self) -> DryRunReport {
        DryRunReport::from_actions(self.log.snapshot())
    }

    pub fn print_report(report: &DryRunReport) {
        println!("{}", report.render());
    }

    async fn simulate(
        &self,
        sim_ctx: &mut ExecutionContext,
        start_at: Option<&str>,
    ) -> Result<RunSummary, PipelineError> {
        let pipeline = self.composition.effective();
        let start = resolve_start(&pipeline, start_at, self.messages.as_ref())?;
        let mut executed = Vec::new();
        run_pipeline(
            &pipeline.steps()[start..],
            sim_ctx,
            self.composition.registry(),
            None,
            &mut executed,
            self.messages.as_ref(),
        )
        .await
    }
}

#[async_trait]
impl Runner for DryRunExecutor {
    fn step_names(&self) -> Vec<String> {
        self.composition.step_names()
    }

    /// Simulates against a derived context; `ctx` itself is not modified.
    async fn run(
        &mut self,
        ctx: &mut ExecutionContext,
        start_at: Option<&str>,
    ) -> Result<RunSummary, PipelineError> {
        self.execute(ctx, start_at).await;
        Ok(self.last_summary.clone().unwrap_or(RunSummary {
            status: RunStatus::Failed,
            executed: Vec::new(),
            skipped: Vec::new(),
            failed: Vec::new(),
        }))
    }
}
