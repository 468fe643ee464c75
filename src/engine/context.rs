//! Execution context threaded through every step and hook of a run.

use crate::engine::dry_run::{ActionLog, DryRunAction};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// State key set to `true` on contexts derived for a dry run.
pub const DRY_RUN_KEY: &str = "dryRun";

/// Opaque generation configuration handed to steps.
///
/// The engine never inspects it; steps read whatever keys they agreed on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GenerationConfig(Value);

impl GenerationConfig {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

/// Insertion-ordered scratchpad shared by steps and hooks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContextState(IndexMap<String, Value>);

impl ContextState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild state from ordered `(key, value)` pairs, as stored in checkpoints.
    pub fn from_entries(entries: impl IntoIterator<Item = (String, Value)>) -> Self {
        Self(entries.into_iter().collect())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Insert or replace a value. Replacing keeps the key's original position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.shift_remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Copy every entry of `other` into this state, `other` winning on collisions.
    pub fn merge(&mut self, other: &ContextState) {
        for (key, value) in other.iter() {
            self.0.insert(key.clone(), value.clone());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Ordered snapshot of all entries.
    pub fn entries(&self) -> Vec<(String, Value)> {
        self.0
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// What happens to the side effects a step declares.
#[derive(Debug, Clone, Default)]
pub enum EffectPolicy {
    /// Steps perform their effects for real.
    #[default]
    Perform,
    /// Steps record their effects into the shared log instead.
    Record(ActionLog),
}

/// Mutable context owned by a single pipeline run.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    pub config: GenerationConfig,
    pub state: ContextState,
    pub checkpoint_path: PathBuf,
    effects: EffectPolicy,
}

impl ExecutionContext {
    pub fn new(config: GenerationConfig, checkpoint_path: impl Into<PathBuf>) -> Self {
        Self {
            config,
            state: ContextState::new(),
            checkpoint_path: checkpoint_path.into(),
            effects: EffectPolicy::Perform,
        }
    }

    pub fn with_state(mut self, state: ContextState) -> Self {
        self.state = state;
        self
    }

    pub fn checkpoint_path(&self) -> &Path {
        &self.checkpoint_path
    }

    pub fn effects(&self) -> &EffectPolicy {
        &self.effects
    }

    pub fn is_dry_run(&self) -> bool {
        matches!(self.effects, EffectPolicy::Record(_))
    }

    /// Record an intended action. Returns `false` (and records nothing)
    /// when the context performs effects for real.
    pub fn record(&self, action: DryRunAction) -> bool {
        match &self.effects {
            EffectPolicy::Record(log) => {
                log.push(action);
                true
            }
            EffectPolicy::Perform => false,
        }
    }

    /// Build a new simulating context. `self` is left untouched.
    pub fn derive_dry_run(&self, log: ActionLog) -> Self {
        let mut state = self.state.clone();
        state.insert(DRY_RUN_KEY, true);
        Self {
            config: self.config.clone(),
            state,
            checkpoint_path: self.checkpoint_path.clone(),
            effects: EffectPolicy::Record(log),
        }
    }
}
