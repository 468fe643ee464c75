//! Ordered step lists and the merge of plugin steps ahead of explicit ones.

use crate::engine::step::{SharedStep, Step};
use crate::plugin::PluginRegistry;
use std::fmt;
use std::sync::Arc;

/// Ordered list of steps. Duplicate names are allowed; lookups by name use
/// the first match.
#[derive(Clone, Default)]
pub struct Pipeline {
    steps: Vec<SharedStep>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_steps(steps: Vec<SharedStep>) -> Self {
        Self { steps }
    }

    pub fn push(&mut self, step: SharedStep) {
        self.steps.push(step);
    }

    pub fn with_step(mut self, step: impl Step + 'static) -> Self {
        self.steps.push(Arc::new(step));
        self
    }

    pub fn steps(&self) -> &[SharedStep] {
        &self.steps
    }

    pub fn names(&self) -> Vec<String> {
        self.steps.iter().map(|s| s.name().to_string()).collect()
    }

    /// Index of the first step named `name`.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.steps.iter().position(|s| s.name() == name)
    }

    /// Map completed step names back to pipeline indices, in order.
    ///
    /// Each name matches the next step so named after the previous match, so a
    /// repeated name resolves to its successive occurrences. A name with no
    /// such step resolves to `None` and leaves the cursor in place.
    pub fn resolve_sequence(&self, names: &[String]) -> Vec<Option<usize>> {
        let mut cursor = 0;
        names
            .iter()
            .map(|name| {
                let found = self.steps[cursor..]
                    .iter()
                    .position(|s| s.name() == name)
                    .map(|offset| cursor + offset);
                if let Some(index) = found {
                    cursor = index + 1;
                }
                found
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// Plugin registry plus explicitly added steps: what both executors run.
#[derive(Clone, Default)]
pub struct PipelineComposition {
    registry: Arc<PluginRegistry>,
    explicit: Pipeline,
}

impl PipelineComposition {
    pub fn new(registry: Arc<PluginRegistry>) -> Self {
        Self {
            registry,
            explicit: Pipeline::new(),
        }
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    pub fn add_step(&mut self, step: SharedStep) {
        self.explicit.push(step);
    }

    pub fn explicit(&self) -> &Pipeline {
        &self.explicit
    }

    /// Plugin steps in registration order, then explicit steps in insertion order.
    pub fn effective(&self) -> Pipeline {
        let mut steps = self.registry.steps();
        steps.extend(self.explicit.steps().iter().cloned());
        Pipeline::from_steps(steps)
    }

    pub fn step_names(&self) -> Vec<String> {
        self.effective().names()
    }
}

impl fmt::Debug for PipelineComposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineComposition")
            .field("plugins", &self.registry.len())
            .field("steps", &self.step_names())
            .finish()
    }
}
