//! Checkpoint persistence: executed step names plus a state snapshot, one
//! JSON file per run, overwritten after every completed step.

use crate::engine::context::ContextState;
use crate::error::CheckpointError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// On-disk checkpoint document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checkpoint {
    pub executed_steps: Vec<String>,
    /// Ordered `[key, value]` pairs.
    pub state: Vec<(String, Value)>,
    pub timestamp: DateTime<Utc>,
}

impl Checkpoint {
    pub fn new(executed_steps: &[String], state: &ContextState) -> Self {
        Self {
            executed_steps: executed_steps.to_vec(),
            state: state.entries(),
            timestamp: Utc::now(),
        }
    }
}

/// What a restore hands back to the caller.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RestoredCheckpoint {
    pub executed_steps: Vec<String>,
    pub state: ContextState,
}

impl RestoredCheckpoint {
    pub fn is_empty(&self) -> bool {
        self.executed_steps.is_empty() && self.state.is_empty()
    }

    pub fn last_step(&self) -> Option<&str> {
        self.executed_steps.last().map(String::as_str)
    }
}

impl From<Checkpoint> for RestoredCheckpoint {
    fn from(checkpoint: Checkpoint) -> Self {
        Self {
            executed_steps: checkpoint.executed_steps,
            state: ContextState::from_entries(checkpoint.state),
        }
    }
}

/// File-backed checkpoint store keyed by path.
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    path: PathBuf,
}

impl CheckpointStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Write a fresh checkpoint, replacing any previous one.
    ///
    /// The document goes to a sibling temp file first and is renamed into
    /// place, so readers never observe a partial write.
    pub fn save(
        &self,
        executed_steps: &[String],
        state: &ContextState,
    ) -> Result<Checkpoint, CheckpointError> {
        let checkpoint = Checkpoint::new(executed_steps, state);
        let encoded = serde_json::to_vec_pretty(&checkpoint)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| CheckpointError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let tmp_path = self.tmp_path();
        std::fs::write(&tmp_path, encoded).map_err(|source| CheckpointError::Io {
            path: tmp_path.clone(),
            source,
        })?;
        std::fs::rename(&tmp_path, &self.path).map_err(|source| CheckpointError::Io {
            path: self.path.clone(),
            source,
        })?;
        Ok(checkpoint)
    }

    /// Read the checkpoint, `None` when no file exists.
    pub fn load(&self) -> Result<Option<Checkpoint>, CheckpointError> {
        let raw = match std::fs::read(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(CheckpointError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        let checkpoint = serde_json::from_slice(&raw).map_err(|source| CheckpointError::Parse {
            path: self.path.clone(),
            source,
        })?;
        Ok(Some(checkpoint))
    }

    /// Restore executed steps and state. A missing file restores to empty.
    pub fn restore(&self) -> Result<RestoredCheckpoint, CheckpointError> {
        Ok(self.load()?.map(RestoredCheckpoint::from).unwrap_or_default())
    }

    /// Delete the checkpoint. Returns whether a file was removed.
    pub fn clear(&self) -> Result<bool, CheckpointError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(CheckpointError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "checkpoint".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
