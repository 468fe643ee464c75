//! Generation pipeline engine.
//!
//! ```text
//! PluginRegistry ─┐
//!                 ├─→ PipelineComposition ─→ run_pipeline ─┬─→ StepExecutor  (perform + checkpoint)
//! explicit steps ─┘                                        └─→ DryRunExecutor (record, keep going)
//! ```
//!
//! Steps run strictly one at a time; each step's future is awaited to
//! completion before the next starts, because steps and hooks share the
//! context's state without synchronization.

pub mod checkpoint;
pub mod context;
pub mod dry_run;
pub mod executor;
pub mod messages;
pub mod pipeline;
pub mod run;
pub mod step;

pub use checkpoint::{Checkpoint, CheckpointStore, RestoredCheckpoint};
pub use context::{ContextState, EffectPolicy, ExecutionContext, GenerationConfig, DRY_RUN_KEY};
pub use dry_run::{
    ActionKind, ActionLog, DryRunAction, DryRunExecutor, DryRunReport, DryRunSummary,
};
pub use executor::{RollbackReport, StepExecutor};
pub use messages::{EnglishMessages, MessageKey, Messages};
pub use pipeline::{Pipeline, PipelineComposition};
pub use run::{RunStatus, RunSummary, Runner};
pub use step::{FnStep, SharedStep, Step};
