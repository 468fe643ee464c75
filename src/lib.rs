//! Scaffold: Checkpointed Generation Pipelines
//!
//! Runs ordered generation steps against a shared execution context, with
//! checkpoint/resume, best-effort rollback, plugin lifecycle hooks, and a
//! dry-run mode that records intended side effects instead of performing them.

pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod manifest;
pub mod plugin;

pub use engine::{
    ExecutionContext, GenerationConfig, Pipeline, RunStatus, RunSummary, Runner, Step,
    StepExecutor,
};
pub use error::{CheckpointError, PipelineError};
pub use plugin::{Hook, HookKind, Plugin, PluginRegistry};
