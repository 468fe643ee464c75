//! Step contract: one named, orderable unit of pipeline work.

use crate::engine::context::ExecutionContext;
use async_trait::async_trait;
use futures::future::BoxFuture;
use std::fmt;
use std::sync::Arc;

/// A unit of work supplied to the engine.
///
/// Steps are immutable once added to a pipeline. They may read and write
/// `ctx.state` but own no engine state themselves.
#[async_trait]
pub trait Step: Send + Sync {
    fn name(&self) -> &str;

    /// Human text used in logs and listings.
    fn description(&self) -> &str;

    async fn execute(&self, ctx: &mut ExecutionContext) -> anyhow::Result<()>;

    /// Whether [`Step::rollback`] does anything. Steps without one are passed
    /// over during rollback.
    fn has_rollback(&self) -> bool {
        false
    }

    async fn rollback(&self, _ctx: &mut ExecutionContext) -> anyhow::Result<()> {
        Ok(())
    }

    fn should_skip(&self, _ctx: &ExecutionContext) -> bool {
        false
    }
}

pub type SharedStep = Arc<dyn Step>;

type StepFn =
    Box<dyn for<'a> Fn(&'a mut ExecutionContext) -> BoxFuture<'a, anyhow::Result<()>> + Send + Sync>;
type SkipFn = Box<dyn Fn(&ExecutionContext) -> bool + Send + Sync>;

/// Closure-backed step.
///
/// ```ignore
/// let step = FnStep::new("init", "Create workspace root", |ctx| {
///     Box::pin(async move {
///         ctx.state.insert("root", "/tmp/acme");
///         Ok(())
///     })
/// });
/// ```
pub struct FnStep {
    name: String,
    description: String,
    run: StepFn,
    undo: Option<StepFn>,
    skip: Option<SkipFn>,
}

impl FnStep {
    pub fn new<F>(name: impl Into<String>, description: impl Into<String>, run: F) -> Self
    where
        F: for<'a> Fn(&'a mut ExecutionContext) -> BoxFuture<'a, anyhow::Result<()>>
            + Send
            + Sync
            + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            run: Box::new(run),
            undo: None,
            skip: None,
        }
    }

    pub fn with_rollback<F>(mut self, undo: F) -> Self
    where
        F: for<'a> Fn(&'a mut ExecutionContext) -> BoxFuture<'a, anyhow::Result<()>>
            + Send
            + Sync
            + 'static,
    {
        self.undo = Some(Box::new(undo));
        self
    }

    pub fn with_skip<F>(mut self, skip: F) -> Self
    where
        F: Fn(&ExecutionContext) -> bool + Send + Sync + 'static,
    {
        self.skip = Some(Box::new(skip));
        self
    }

    pub fn shared(self) -> SharedStep {
        Arc::new(self)
    }
}

impl fmt::Debug for FnStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnStep")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("rollback", &self.undo.is_some())
            .field("skip", &self.skip.is_some())
            .finish()
    }
}

#[async_trait]
impl Step for FnStep {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn execute(&self, ctx: &mut ExecutionContext) -> anyhow::Result<()> {
        (self.run)(ctx).await
    }

    fn has_rollback(&self) -> bool {
        self.undo.is_some()
    }

    async fn rollback(&self, ctx: &mut ExecutionContext) -> anyhow::Result<()> {
        match &self.undo {
            Some(undo) => undo(ctx).await,
            None => Ok(()),
        }
    }

    fn should_skip(&self, ctx: &ExecutionContext) -> bool {
        self.skip.as_ref().map(|skip| skip(ctx)).unwrap_or(false)
    }
}
