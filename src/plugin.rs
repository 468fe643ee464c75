//! Plugins: third-party extensions that contribute steps, observe lifecycle
//! hooks, and expose template metadata.

pub mod hooks;
pub mod registry;
pub mod tracing_plugin;

pub use hooks::{Hook, HookKind};
pub use registry::PluginRegistry;
pub use tracing_plugin::TracingPlugin;

use crate::engine::context::ExecutionContext;
use crate::engine::step::SharedStep;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::path::PathBuf;

/// Plugin contract.
///
/// Only hooks whose kind appears in [`Plugin::hooks`] are delivered to
/// [`Plugin::on_hook`]. Hook failures are logged by the registry and never
/// reach the run.
#[async_trait]
pub trait Plugin: Send + Sync {
    fn name(&self) -> &str;

    fn version(&self) -> &str;

    fn hooks(&self) -> &[HookKind] {
        &[]
    }

    async fn on_hook(&self, _hook: &Hook<'_>, _ctx: &mut ExecutionContext) -> anyhow::Result<()> {
        Ok(())
    }

    /// Steps prepended to the explicit pipeline.
    fn steps(&self) -> Vec<SharedStep> {
        Vec::new()
    }

    fn templates(&self) -> Option<&dyn TemplateProvider> {
        None
    }
}

/// Side-channel template metadata a plugin may expose.
pub trait TemplateProvider: Send + Sync {
    fn templates_dir(&self) -> PathBuf;

    fn variables(&self, _ctx: &ExecutionContext) -> Map<String, Value> {
        Map::new()
    }
}
