//! Lifecycle hooks: a closed set of kinds with fixed payloads.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Discriminant of [`Hook`], used by plugins to declare what they handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HookKind {
    BeforeGeneration,
    AfterGeneration,
    BeforeStep,
    AfterStep,
    OnError,
}

impl HookKind {
    pub const ALL: [HookKind; 5] = [
        HookKind::BeforeGeneration,
        HookKind::AfterGeneration,
        HookKind::BeforeStep,
        HookKind::AfterStep,
        HookKind::OnError,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HookKind::BeforeGeneration => "beforeGeneration",
            HookKind::AfterGeneration => "afterGeneration",
            HookKind::BeforeStep => "beforeStep",
            HookKind::AfterStep => "afterStep",
            HookKind::OnError => "onError",
        }
    }
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A lifecycle event delivered to plugins.
#[derive(Debug, Clone, Copy)]
pub enum Hook<'a> {
    BeforeGeneration,
    AfterGeneration,
    BeforeStep { step: &'a str },
    AfterStep { step: &'a str },
    OnError {
        step: &'a str,
        error: &'a anyhow::Error,
    },
}

impl Hook<'_> {
    pub fn kind(&self) -> HookKind {
        match self {
            Hook::BeforeGeneration => HookKind::BeforeGeneration,
            Hook::AfterGeneration => HookKind::AfterGeneration,
            Hook::BeforeStep { .. } => HookKind::BeforeStep,
            Hook::AfterStep { .. } => HookKind::AfterStep,
            Hook::OnError { .. } => HookKind::OnError,
        }
    }

    /// Step the hook concerns, if any.
    pub fn step(&self) -> Option<&str> {
        match self {
            Hook::BeforeStep { step } | Hook::AfterStep { step } | Hook::OnError { step, .. } => {
                Some(step)
            }
            Hook::BeforeGeneration | Hook::AfterGeneration => None,
        }
    }
}
