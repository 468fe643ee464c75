//! Integration tests for best-effort rollback

use crate::integration::test_utils::{
    context_in, event_log, events, failing_step, labelled_step, plain_step, recording_step,
    EventLog,
};
use scaffold::engine::{FnStep, StepExecutor};
use tempfile::TempDir;

#[tokio::test]
async fn rollback_undoes_completed_steps_latest_first() {
    let dir = TempDir::new().unwrap();
    let log = event_log();
    let mut executor = StepExecutor::default();
    executor.add_step(recording_step("a", &log));
    executor.add_step(plain_step("b", &log));
    executor.add_step(recording_step("c", &log));
    executor.add_step(failing_step("d", "x", &log));

    let mut ctx = context_in(&dir);
    assert!(executor.execute(&mut ctx, None).await.is_err());
    assert_eq!(executor.executed_steps(), ["a", "b", "c"]);

    log.lock().clear();
    let report = executor.rollback(&mut ctx).await;
    assert_eq!(events(&log), vec!["undo:c", "undo:a"]);
    assert_eq!(report.rolled_back, vec!["c", "a"]);
    assert!(report.is_clean());
}

#[tokio::test]
async fn failing_rollback_does_not_stop_earlier_rollbacks() {
    let dir = TempDir::new().unwrap();
    let log = event_log();
    let mut executor = StepExecutor::default();
    executor.add_step(recording_step("a", &log));
    executor.add_step(
        FnStep::new("b", "undo fails", |_ctx| Box::pin(async { Ok(()) }))
            .with_rollback(|_ctx| Box::pin(async { Err(anyhow::anyhow!("cannot undo")) }))
            .shared(),
    );

    let mut ctx = context_in(&dir);
    executor.execute(&mut ctx, None).await.unwrap();
    log.lock().clear();

    let report = executor.rollback(&mut ctx).await;
    assert_eq!(events(&log), vec!["undo:a"]);
    assert_eq!(report.rolled_back, vec!["a"]);
    assert_eq!(
        report.failures,
        vec![("b".to_string(), "cannot undo".to_string())]
    );
    assert!(!report.is_clean());
}

#[tokio::test]
async fn rollback_with_nothing_executed_is_a_no_op() {
    let dir = TempDir::new().unwrap();
    let log = event_log();
    let mut executor = StepExecutor::default();
    executor.add_step(recording_step("a", &log));

    let mut ctx = context_in(&dir);
    let report = executor.rollback(&mut ctx).await;
    assert!(report.rolled_back.is_empty());
    assert!(events(&log).is_empty());
}

#[tokio::test]
async fn seeded_executed_list_rolls_back_a_previous_process() {
    let dir = TempDir::new().unwrap();
    let log = event_log();
    let mut executor = StepExecutor::default();
    executor.add_step(recording_step("a", &log));
    executor.add_step(recording_step("b", &log));
    executor.add_step(recording_step("c", &log));

    let restored = {
        let mut ctx = context_in(&dir);
        executor.execute(&mut ctx, None).await.unwrap();
        StepExecutor::restore_checkpoint(ctx.checkpoint_path()).unwrap()
    };
    log.lock().clear();

    let mut fresh = StepExecutor::default();
    fresh.add_step(recording_step("a", &log));
    fresh.add_step(recording_step("b", &log));
    fresh.add_step(recording_step("c", &log));
    fresh.seed_executed(restored.executed_steps);

    let mut ctx = context_in(&dir).with_state(restored.state);
    fresh.rollback(&mut ctx).await;
    assert_eq!(events(&log), vec!["undo:c", "undo:b", "undo:a"]);
    assert!(fresh.executed_steps().is_empty());
}

fn repeated_name_pipeline(log: &EventLog) -> StepExecutor {
    let mut executor = StepExecutor::default();
    executor.add_step(labelled_step("a", "a", log));
    executor.add_step(labelled_step("dup", "dup1", log));
    executor.add_step(labelled_step("b", "b", log));
    executor.add_step(labelled_step("dup", "dup2", log));
    executor.add_step(labelled_step("c", "c", log));
    executor
}

#[tokio::test]
async fn rollback_reaches_every_occurrence_of_a_repeated_name() {
    let dir = TempDir::new().unwrap();
    let log = event_log();
    let mut executor = repeated_name_pipeline(&log);

    let mut ctx = context_in(&dir);
    executor.execute(&mut ctx, None).await.unwrap();
    log.lock().clear();

    let report = executor.rollback(&mut ctx).await;
    assert_eq!(
        events(&log),
        vec!["undo:c", "undo:dup2", "undo:b", "undo:dup1", "undo:a"]
    );
    assert_eq!(report.rolled_back, vec!["c", "dup", "b", "dup", "a"]);
}

#[tokio::test]
async fn seeded_repeated_names_bind_to_successive_occurrences() {
    let dir = TempDir::new().unwrap();
    let log = event_log();
    let mut executor = repeated_name_pipeline(&log);
    executor.seed_executed(
        ["a", "dup", "b", "dup"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
    );

    let mut ctx = context_in(&dir);
    executor.rollback(&mut ctx).await;
    assert_eq!(
        events(&log),
        vec!["undo:dup2", "undo:b", "undo:dup1", "undo:a"]
    );
}
