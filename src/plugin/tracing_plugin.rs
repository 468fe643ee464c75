//! Plugin that mirrors every lifecycle hook into structured `tracing` events.

use crate::engine::context::ExecutionContext;
use crate::plugin::hooks::{Hook, HookKind};
use crate::plugin::Plugin;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::time::Instant;
use tracing::{error, info};

pub struct TracingPlugin {
    started: Mutex<Option<Instant>>,
    step_started: Mutex<Option<Instant>>,
}

impl TracingPlugin {
    pub fn new() -> Self {
        Self {
            started: Mutex::new(None),
            step_started: Mutex::new(None),
        }
    }
}

impl Default for TracingPlugin {
    fn default() -> Self {
        Self::new()
    }
}

fn elapsed_ms(slot: &Mutex<Option<Instant>>) -> u64 {
    slot.lock()
        .take()
        .map(|start| start.elapsed().as_millis() as u64)
        .unwrap_or(0)
}

#[async_trait]
impl Plugin for TracingPlugin {
    fn name(&self) -> &str {
        "tracing"
    }

    fn version(&self) -> &str {
        env!("CARGO_PKG_VERSION")
    }

    fn hooks(&self) -> &[HookKind] {
        &HookKind::ALL
    }

    async fn on_hook(&self, hook: &Hook<'_>, ctx: &mut ExecutionContext) -> anyhow::Result<()> {
        let dry_run = ctx.is_dry_run();
        match hook {
            Hook::BeforeGeneration => {
                *self.started.lock() = Some(Instant::now());
                info!(hook = "beforeGeneration", dry_run, "Generation started");
            }
            Hook::AfterGeneration => {
                let duration_ms = elapsed_ms(&self.started);
                info!(hook = "afterGeneration", dry_run, duration_ms, "Generation finished");
            }
            Hook::BeforeStep { step } => {
                *self.step_started.lock() = Some(Instant::now());
                info!(hook = "beforeStep", step = *step, dry_run, "Step started");
            }
            Hook::AfterStep { step } => {
                let duration_ms = elapsed_ms(&self.step_started);
                info!(hook = "afterStep", step = *step, dry_run, duration_ms, "Step finished");
            }
            Hook::OnError { step, error } => {
                let duration_ms = elapsed_ms(&self.step_started);
                error!(
                    hook = "onError",
                    step = *step,
                    dry_run,
                    duration_ms,
                    error = %error,
                    "Step failed"
                );
            }
        }
        Ok(())
    }
}
