//! Plugin registry: ordered list of registered plugins and hook dispatch.

use crate::engine::context::ExecutionContext;
use crate::engine::messages::{EnglishMessages, MessageKey, Messages};
use crate::engine::step::SharedStep;
use crate::plugin::hooks::Hook;
use crate::plugin::Plugin;
use serde_json::{Map, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

/// Holds plugins in registration order.
///
/// Names are not required to be unique; a duplicate simply coexists with
/// the earlier registration.
#[derive(Clone)]
pub struct PluginRegistry {
    plugins: Vec<Arc<dyn Plugin>>,
    messages: Arc<dyn Messages>,
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::with_messages(Arc::new(EnglishMessages))
    }

    pub fn with_messages(messages: Arc<dyn Messages>) -> Self {
        Self {
            plugins: Vec::new(),
            messages,
        }
    }

    pub fn register(&mut self, plugin: Arc<dyn Plugin>) {
        debug!(
            plugin = plugin.name(),
            version = plugin.version(),
            "{}",
            self.messages.text(MessageKey::PluginRegistered, plugin.name())
        );
        self.plugins.push(plugin);
    }

    pub fn plugins(&self) -> &[Arc<dyn Plugin>] {
        &self.plugins
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Every plugin's steps, concatenated in registration order.
    pub fn steps(&self) -> Vec<SharedStep> {
        self.plugins.iter().flat_map(|p| p.steps()).collect()
    }

    /// Deliver `hook` to each plugin that declares its kind, one at a time.
    ///
    /// Failures are logged and isolated: later plugins still run and nothing
    /// propagates. Returns the number of plugins whose hook failed.
    pub async fn invoke(&self, hook: &Hook<'_>, ctx: &mut ExecutionContext) -> usize {
        let kind = hook.kind();
        let mut failures = 0usize;
        for plugin in &self.plugins {
            if !plugin.hooks().contains(&kind) {
                continue;
            }
            if let Err(err) = plugin.on_hook(hook, ctx).await {
                failures += 1;
                warn!(
                    plugin = plugin.name(),
                    hook = %kind,
                    error = %err,
                    "{}",
                    self.messages.text(MessageKey::HookFailed, plugin.name())
                );
            }
        }
        failures
    }

    /// Merge template variables from every template provider; later plugins
    /// win on key collisions.
    pub fn template_variables(&self, ctx: &ExecutionContext) -> Map<String, Value> {
        let mut merged = Map::new();
        for plugin in &self.plugins {
            if let Some(templates) = plugin.templates() {
                for (key, value) in templates.variables(ctx) {
                    merged.insert(key, value);
                }
            }
        }
        merged
    }

    /// Template directories of every template provider, in registration order.
    pub fn template_dirs(&self) -> Vec<PathBuf> {
        self.plugins
            .iter()
            .filter_map(|p| p.templates().map(|t| t.templates_dir()))
            .collect()
    }
}
