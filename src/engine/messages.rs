//! Display text for engine log lines.
//!
//! The engine never branches on these strings; they only feed log output.
//! Callers that localize output inject their own [`Messages`] implementation.

/// Every piece of text the engine may log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKey {
    RunStarted,
    RunCompleted,
    StepStarted,
    StepCompleted,
    StepSkipped,
    StepFailed,
    DryRunStepFailed,
    DryRunAborted,
    HookFailed,
    PluginRegistered,
    CheckpointSaved,
    CheckpointRestored,
    RollbackStep,
    RollbackFailed,
    StepNotInPipeline,
    InvalidStartStep,
}

/// Translation service consumed by executors and the plugin registry.
pub trait Messages: Send + Sync {
    /// Render `key` for `subject` (a step name, plugin name, or path).
    fn text(&self, key: MessageKey, subject: &str) -> String;
}

/// Built-in English text.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnglishMessages;

impl Messages for EnglishMessages {
    fn text(&self, key: MessageKey, subject: &str) -> String {
        match key {
            MessageKey::RunStarted => format!("Starting pipeline ({} steps)", subject),
            MessageKey::RunCompleted => "Pipeline completed".to_string(),
            MessageKey::StepStarted => format!("Running step {}", subject),
            MessageKey::StepCompleted => format!("Completed step {}", subject),
            MessageKey::StepSkipped => format!("Skipping step {}", subject),
            MessageKey::StepFailed => format!("Step {} failed", subject),
            MessageKey::DryRunStepFailed => {
                format!("Step {} failed during dry run; continuing", subject)
            }
            MessageKey::DryRunAborted => "Dry run stopped early".to_string(),
            MessageKey::HookFailed => format!("Plugin {} hook failed", subject),
            MessageKey::PluginRegistered => format!("Registered plugin {}", subject),
            MessageKey::CheckpointSaved => format!("Checkpoint saved to {}", subject),
            MessageKey::CheckpointRestored => format!("Checkpoint restored from {}", subject),
            MessageKey::RollbackStep => format!("Rolling back step {}", subject),
            MessageKey::RollbackFailed => format!("Rollback of step {} failed", subject),
            MessageKey::StepNotInPipeline => {
                format!("Executed step {} is no longer in the pipeline", subject)
            }
            MessageKey::InvalidStartStep => format!("Invalid start step: {}", subject),
        }
    }
}
