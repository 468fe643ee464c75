//! Shared test utilities for integration tests
//!
//! Recording plugins and steps that write what happened into a shared event
//! log, plus isolated XDG environment setup for config tests.

use async_trait::async_trait;
use parking_lot::Mutex;
use scaffold::engine::{ExecutionContext, FnStep, GenerationConfig, SharedStep};
use scaffold::plugin::{Hook, HookKind, Plugin};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

pub type EventLog = Arc<Mutex<Vec<String>>>;

pub fn event_log() -> EventLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn events(log: &EventLog) -> Vec<String> {
    log.lock().clone()
}

/// Context whose checkpoint lives at `<dir>/checkpoint.json`.
pub fn context_in(dir: &TempDir) -> ExecutionContext {
    ExecutionContext::new(GenerationConfig::default(), checkpoint_in(dir))
}

pub fn checkpoint_in(dir: &TempDir) -> PathBuf {
    dir.path().join("checkpoint.json")
}

/// Step that logs `run:<name>`, sets `state[name] = true`, and logs
/// `undo:<name>` on rollback.
pub fn recording_step(name: &'static str, log: &EventLog) -> SharedStep {
    let run_log = log.clone();
    let undo_log = log.clone();
    FnStep::new(name, format!("{} step", name), move |ctx| {
        let log = run_log.clone();
        Box::pin(async move {
            log.lock().push(format!("run:{}", name));
            ctx.state.insert(name, true);
            Ok(())
        })
    })
    .with_rollback(move |_ctx| {
        let log = undo_log.clone();
        Box::pin(async move {
            log.lock().push(format!("undo:{}", name));
            Ok(())
        })
    })
    .shared()
}

/// Like [`recording_step`], but logs `run:<label>` / `undo:<label>` so steps
/// sharing a name can be told apart.
pub fn labelled_step(name: &'static str, label: &'static str, log: &EventLog) -> SharedStep {
    let run_log = log.clone();
    let undo_log = log.clone();
    FnStep::new(name, format!("{} step", label), move |_ctx| {
        let log = run_log.clone();
        Box::pin(async move {
            log.lock().push(format!("run:{}", label));
            Ok(())
        })
    })
    .with_rollback(move |_ctx| {
        let log = undo_log.clone();
        Box::pin(async move {
            log.lock().push(format!("undo:{}", label));
            Ok(())
        })
    })
    .shared()
}

/// Step without a rollback.
pub fn plain_step(name: &'static str, log: &EventLog) -> SharedStep {
    let log = log.clone();
    FnStep::new(name, format!("{} step", name), move |_ctx| {
        let log = log.clone();
        Box::pin(async move {
            log.lock().push(format!("run:{}", name));
            Ok(())
        })
    })
    .shared()
}

/// Step that always fails with `message`.
pub fn failing_step(name: &'static str, message: &'static str, log: &EventLog) -> SharedStep {
    let log = log.clone();
    FnStep::new(name, format!("{} step", name), move |_ctx| {
        let log = log.clone();
        Box::pin(async move {
            log.lock().push(format!("run:{}", name));
            Err(anyhow::anyhow!(message))
        })
    })
    .shared()
}

/// Plugin that logs every delivered hook as `beforeStep(a)`, `onError(b: x)`, ...
pub struct RecordingPlugin {
    name: String,
    hooks: Vec<HookKind>,
    log: EventLog,
    fail_on: Option<HookKind>,
    steps: Vec<SharedStep>,
}

impl RecordingPlugin {
    pub fn new(name: &str, log: &EventLog) -> Self {
        Self {
            name: name.to_string(),
            hooks: HookKind::ALL.to_vec(),
            log: log.clone(),
            fail_on: None,
            steps: Vec::new(),
        }
    }

    pub fn handling(mut self, hooks: &[HookKind]) -> Self {
        self.hooks = hooks.to_vec();
        self
    }

    pub fn failing_on(mut self, kind: HookKind) -> Self {
        self.fail_on = Some(kind);
        self
    }

    pub fn with_step(mut self, step: SharedStep) -> Self {
        self.steps.push(step);
        self
    }
}

pub fn describe(hook: &Hook<'_>) -> String {
    match hook {
        Hook::OnError { step, error } => format!("onError({}: {})", step, error),
        other => match other.step() {
            Some(step) => format!("{}({})", other.kind(), step),
            None => other.kind().to_string(),
        },
    }
}

#[async_trait]
impl Plugin for RecordingPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> &str {
        "0.1.0"
    }

    fn hooks(&self) -> &[HookKind] {
        &self.hooks
    }

    async fn on_hook(&self, hook: &Hook<'_>, _ctx: &mut ExecutionContext) -> anyhow::Result<()> {
        self.log.lock().push(describe(hook));
        if self.fail_on == Some(hook.kind()) {
            anyhow::bail!("{} refused {}", self.name, hook.kind());
        }
        Ok(())
    }

    fn steps(&self) -> Vec<SharedStep> {
        self.steps.clone()
    }
}

/// Global mutex to serialize XDG environment variable access across all tests
static XDG_ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());

/// Environment variable state to restore after test
struct EnvState {
    home: Option<String>,
    xdg_config_home: Option<String>,
}

impl EnvState {
    fn capture() -> Self {
        Self {
            home: std::env::var("HOME").ok(),
            xdg_config_home: std::env::var("XDG_CONFIG_HOME").ok(),
        }
    }

    fn restore(self) {
        match self.home {
            Some(orig) => std::env::set_var("HOME", orig),
            None => std::env::remove_var("HOME"),
        }
        match self.xdg_config_home {
            Some(orig) => std::env::set_var("XDG_CONFIG_HOME", orig),
            None => std::env::remove_var("XDG_CONFIG_HOME"),
        }
    }
}

/// Run `f` with HOME and XDG_CONFIG_HOME pointing inside `test_dir`.
///
/// XDG_CONFIG_HOME is `<test_dir>/config`; HOME is `<test_dir>/home`.
pub fn with_xdg_env<F, R>(test_dir: &TempDir, f: F) -> R
where
    F: FnOnce() -> R,
{
    let _guard = XDG_ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let env_state = EnvState::capture();

    let test_config_home = test_dir.path().join("config");
    let test_home = test_dir.path().join("home");
    std::fs::create_dir_all(&test_config_home).unwrap();
    std::fs::create_dir_all(&test_home).unwrap();

    std::env::set_var("HOME", test_home.to_str().unwrap());
    std::env::set_var("XDG_CONFIG_HOME", test_config_home.to_str().unwrap());

    let result = f();

    env_state.restore();

    result
}
