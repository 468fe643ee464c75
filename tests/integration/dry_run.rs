//! Integration tests for the dry-run executor

use crate::integration::test_utils::{
    checkpoint_in, context_in, event_log, events, failing_step, RecordingPlugin,
};
use scaffold::engine::{
    ActionKind, DryRunAction, DryRunExecutor, FnStep, Runner, RunStatus, SharedStep, DRY_RUN_KEY,
};
use scaffold::plugin::PluginRegistry;
use std::sync::Arc;
use tempfile::TempDir;

/// Records `kind` on `target` when simulating; fails the test otherwise.
fn effect_step(name: &'static str, kind: ActionKind, target: &'static str) -> SharedStep {
    FnStep::new(name, format!("{} step", name), move |ctx| {
        Box::pin(async move {
            if !ctx.is_dry_run() {
                anyhow::bail!("{} tried to perform a real effect", name);
            }
            ctx.record(DryRunAction::new(kind, target, format!("{} {}", kind, target)));
            Ok(())
        })
    })
    .shared()
}

#[tokio::test]
async fn report_lists_actions_in_order_with_summary() {
    let dir = TempDir::new().unwrap();
    let mut executor = DryRunExecutor::default();
    executor.add_step(effect_step("root", ActionKind::Create, "acme/"));
    executor.add_step(effect_step("readme", ActionKind::Create, "acme/README.md"));
    executor.add_step(effect_step("config", ActionKind::Modify, "acme/package.json"));
    executor.add_step(effect_step("stale", ActionKind::Delete, "acme/tmp"));
    executor.add_step(effect_step("install", ActionKind::Command, "npm install"));

    let ctx = context_in(&dir);
    let report = executor.execute(&ctx, None).await;

    let targets: Vec<&str> = report.actions.iter().map(|a| a.target.as_str()).collect();
    assert_eq!(
        targets,
        vec![
            "acme/",
            "acme/README.md",
            "acme/package.json",
            "acme/tmp",
            "npm install"
        ]
    );
    assert_eq!(report.summary.files_created, 2);
    assert_eq!(report.summary.files_modified, 1);
    assert_eq!(report.summary.files_deleted, 1);
    assert_eq!(report.summary.commands_executed, 1);
    assert_eq!(executor.get_report(), report);
}

#[tokio::test]
async fn caller_context_is_never_modified() {
    let dir = TempDir::new().unwrap();
    let mut executor = DryRunExecutor::default();
    executor.add_step(
        FnStep::new("mark", "writes state", |ctx| {
            Box::pin(async move {
                ctx.state.insert("touched", true);
                Ok(())
            })
        })
        .shared(),
    );

    let mut ctx = context_in(&dir);
    ctx.state.insert("projectName", "acme");
    executor.execute(&ctx, None).await;

    assert!(!ctx.state.contains_key(DRY_RUN_KEY));
    assert!(!ctx.state.contains_key("touched"));
    assert_eq!(ctx.state.get_str("projectName"), Some("acme"));
    assert!(!ctx.is_dry_run());
}

#[tokio::test]
async fn simulated_steps_see_dry_run_flag_and_caller_state() {
    let dir = TempDir::new().unwrap();
    let seen = event_log();
    let seen_in_step = seen.clone();
    let mut executor = DryRunExecutor::default();
    executor.add_step(
        FnStep::new("inspect", "reads state", move |ctx| {
            let seen = seen_in_step.clone();
            Box::pin(async move {
                seen.lock().push(format!(
                    "{}:{}",
                    ctx.state.get_bool(DRY_RUN_KEY).unwrap_or(false),
                    ctx.state.get_str("projectName").unwrap_or("-")
                ));
                Ok(())
            })
        })
        .shared(),
    );

    let mut ctx = context_in(&dir);
    ctx.state.insert("projectName", "acme");
    executor.execute(&ctx, None).await;
    assert_eq!(events(&seen), vec!["true:acme"]);
}

#[tokio::test]
async fn failures_are_logged_and_simulation_continues_without_checkpoint() {
    let dir = TempDir::new().unwrap();
    let log = event_log();
    let mut registry = PluginRegistry::new();
    registry.register(Arc::new(RecordingPlugin::new("recorder", &log)));

    let mut executor = DryRunExecutor::new(Arc::new(registry));
    executor.add_step(effect_step("a", ActionKind::Create, "a.txt"));
    executor.add_step(failing_step("b", "broken", &log));
    executor.add_step(effect_step("c", ActionKind::Create, "c.txt"));

    let ctx = context_in(&dir);
    let report = executor.execute(&ctx, None).await;

    assert_eq!(report.summary.files_created, 2);
    assert!(events(&log).contains(&"onError(b: broken)".to_string()));
    assert!(events(&log).contains(&"afterGeneration".to_string()));
    assert!(!checkpoint_in(&dir).exists());
}

#[tokio::test]
async fn each_execute_starts_with_a_fresh_log() {
    let dir = TempDir::new().unwrap();
    let mut executor = DryRunExecutor::default();
    executor.add_step(effect_step("a", ActionKind::Create, "a.txt"));

    let ctx = context_in(&dir);
    executor.execute(&ctx, None).await;
    let second = executor.execute(&ctx, None).await;
    assert_eq!(second.actions.len(), 1);
}

#[tokio::test]
async fn runner_trait_reports_simulation_summary() {
    let dir = TempDir::new().unwrap();
    let mut executor = DryRunExecutor::default();
    executor.add_step(effect_step("a", ActionKind::Create, "a.txt"));
    executor.add_step(effect_step("b", ActionKind::Command, "make"));

    let runner: &mut dyn Runner = &mut executor;
    assert_eq!(runner.step_names(), vec!["a", "b"]);

    let mut ctx = context_in(&dir);
    let summary = runner.run(&mut ctx, Some("b")).await.unwrap();
    assert_eq!(summary.status, RunStatus::Completed);
    assert_eq!(summary.executed, vec!["b"]);
    assert!(!ctx.is_dry_run());
}
