//! Integration tests for the step executor run loop and hook ordering

use crate::integration::test_utils::{
    checkpoint_in, context_in, event_log, events, failing_step, recording_step, RecordingPlugin,
};
use scaffold::engine::{CheckpointStore, FnStep, RunStatus, StepExecutor};
use scaffold::error::PipelineError;
use scaffold::plugin::{HookKind, PluginRegistry};
use std::sync::Arc;
use tempfile::TempDir;

fn executor_with_plugin(log: &crate::integration::test_utils::EventLog) -> StepExecutor {
    let mut registry = PluginRegistry::new();
    registry.register(Arc::new(RecordingPlugin::new("recorder", log)));
    StepExecutor::new(Arc::new(registry))
}

#[tokio::test]
async fn full_run_checkpoints_every_step_and_fires_hooks_in_order() {
    let dir = TempDir::new().unwrap();
    let log = event_log();
    let mut executor = executor_with_plugin(&log);
    for name in ["a", "b", "c"] {
        executor.add_step(recording_step(name, &log));
    }

    let mut ctx = context_in(&dir);
    let summary = executor.execute(&mut ctx, None).await.unwrap();
    assert_eq!(summary.status, RunStatus::Completed);

    assert_eq!(
        events(&log),
        vec![
            "beforeGeneration",
            "beforeStep(a)",
            "run:a",
            "afterStep(a)",
            "beforeStep(b)",
            "run:b",
            "afterStep(b)",
            "beforeStep(c)",
            "run:c",
            "afterStep(c)",
            "afterGeneration",
        ]
    );

    let restored = StepExecutor::restore_checkpoint(&checkpoint_in(&dir)).unwrap();
    assert_eq!(restored.executed_steps, vec!["a", "b", "c"]);
    assert_eq!(restored.state.get_bool("c"), Some(true));
}

#[tokio::test]
async fn start_at_skips_earlier_steps_entirely() {
    let dir = TempDir::new().unwrap();
    let log = event_log();
    let mut executor = StepExecutor::default();
    for name in ["a", "b", "c"] {
        executor.add_step(recording_step(name, &log));
    }

    let mut ctx = context_in(&dir);
    let summary = executor.execute(&mut ctx, Some("b")).await.unwrap();

    assert_eq!(events(&log), vec!["run:b", "run:c"]);
    assert_eq!(summary.executed, vec!["b", "c"]);
    assert!(!ctx.state.contains_key("a"));
}

#[tokio::test]
async fn failing_step_fires_on_error_and_aborts() {
    let dir = TempDir::new().unwrap();
    let log = event_log();
    let mut executor = executor_with_plugin(&log);
    executor.add_step(recording_step("a", &log));
    executor.add_step(failing_step("b", "x", &log));
    executor.add_step(recording_step("c", &log));

    let mut ctx = context_in(&dir);
    let err = executor.execute(&mut ctx, None).await.unwrap_err();

    match &err {
        PipelineError::StepFailed { step, source } => {
            assert_eq!(step, "b");
            assert_eq!(source.to_string(), "x");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(executor.status(), RunStatus::Failed);

    let recorded = events(&log);
    assert!(recorded.contains(&"onError(b: x)".to_string()));
    assert!(!recorded.contains(&"run:c".to_string()));
    assert!(!recorded.contains(&"afterStep(b)".to_string()));
    assert!(!recorded.contains(&"afterGeneration".to_string()));

    let restored = StepExecutor::restore_checkpoint(&checkpoint_in(&dir)).unwrap();
    assert_eq!(restored.executed_steps, vec!["a"]);
}

#[tokio::test]
async fn unknown_start_step_fires_no_hooks() {
    let dir = TempDir::new().unwrap();
    let log = event_log();
    let mut executor = executor_with_plugin(&log);
    executor.add_step(recording_step("a", &log));

    let mut ctx = context_in(&dir);
    let err = executor.execute(&mut ctx, Some("nope")).await.unwrap_err();
    assert!(matches!(err, PipelineError::InvalidStartStep(ref name) if name == "nope"));
    assert!(events(&log).is_empty());
    assert!(!CheckpointStore::new(checkpoint_in(&dir)).exists());
}

#[tokio::test]
async fn skipped_steps_fire_no_step_hooks_and_are_not_checkpointed() {
    let dir = TempDir::new().unwrap();
    let log = event_log();
    let mut executor = executor_with_plugin(&log);
    executor.add_step(recording_step("a", &log));
    executor.add_step(
        FnStep::new("b", "skipped when a ran", |_ctx| Box::pin(async { Ok(()) }))
            .with_skip(|ctx| ctx.state.get_bool("a").unwrap_or(false))
            .shared(),
    );
    executor.add_step(recording_step("c", &log));

    let mut ctx = context_in(&dir);
    let summary = executor.execute(&mut ctx, None).await.unwrap();

    assert_eq!(summary.skipped, vec!["b"]);
    let recorded = events(&log);
    assert!(!recorded.iter().any(|e| e.contains("(b)")));

    let restored = StepExecutor::restore_checkpoint(&checkpoint_in(&dir)).unwrap();
    assert_eq!(restored.executed_steps, vec!["a", "c"]);
}

#[tokio::test]
async fn duplicate_names_start_at_first_match() {
    let dir = TempDir::new().unwrap();
    let log = event_log();
    let mut executor = StepExecutor::default();
    executor.add_step(recording_step("a", &log));
    executor.add_step(recording_step("dup", &log));
    executor.add_step(recording_step("b", &log));
    executor.add_step(recording_step("dup", &log));

    let mut ctx = context_in(&dir);
    executor.execute(&mut ctx, Some("dup")).await.unwrap();
    assert_eq!(events(&log), vec!["run:dup", "run:b", "run:dup"]);
}

#[tokio::test]
async fn empty_pipeline_still_fires_generation_hooks() {
    let dir = TempDir::new().unwrap();
    let log = event_log();
    let mut registry = PluginRegistry::new();
    registry.register(Arc::new(
        RecordingPlugin::new("recorder", &log)
            .handling(&[HookKind::BeforeGeneration, HookKind::AfterGeneration]),
    ));
    let mut executor = StepExecutor::new(Arc::new(registry));

    let mut ctx = context_in(&dir);
    let summary = executor.execute(&mut ctx, None).await.unwrap();
    assert!(summary.executed.is_empty());
    assert_eq!(events(&log), vec!["beforeGeneration", "afterGeneration"]);
}
