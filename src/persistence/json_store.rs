//! JSON file checkpoint store with atomic replacement.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, warn};

use super::CheckpointStore;
use crate::models::Checkpoint;
use crate::{AppError, Result};

/// Checkpoint persisted as pretty-printed JSON at a fixed path.
#[derive(Debug, Clone)]
pub struct JsonCheckpointStore {
    path: PathBuf,
}

impl JsonCheckpointStore {
    /// Create a store backed by `path`. Nothing is touched until the first
    /// [`save`](CheckpointStore::save).
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the checkpoint file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the directory that will hold the checkpoint.
    ///
    /// Called at startup so an uncreatable location aborts the run before
    /// anything is sent.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Checkpoint` if the directory cannot be created.
    pub fn prepare(&self) -> Result<()> {
        let parent = self.parent_dir();
        fs::create_dir_all(parent).map_err(|err| {
            AppError::Checkpoint(format!(
                "failed to create checkpoint directory {}: {err}",
                parent.display()
            ))
        })
    }

    fn parent_dir(&self) -> &Path {
        // A bare file name has an empty parent: the working directory.
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }
}

impl CheckpointStore for JsonCheckpointStore {
    fn load(&self) -> Checkpoint {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no checkpoint found, starting from the beginning");
            return Checkpoint::default();
        }

        let raw = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) => {
                warn!(
                    path = %self.path.display(),
                    %err,
                    "failed to read checkpoint, starting from the beginning"
                );
                return Checkpoint::default();
            }
        };

        if raw.trim().is_empty() {
            warn!(
                path = %self.path.display(),
                "checkpoint file is empty, starting from the beginning"
            );
            return Checkpoint::default();
        }

        match serde_json::from_str(&raw) {
            Ok(checkpoint) => checkpoint,
            Err(err) => {
                warn!(
                    path = %self.path.display(),
                    %err,
                    "malformed checkpoint, starting from the beginning"
                );
                Checkpoint::default()
            }
        }
    }

    fn save(&self, checkpoint: &Checkpoint) -> Result<()> {
        self.prepare()?;
        let parent = self.parent_dir();

        let mut body = serde_json::to_string_pretty(checkpoint)
            .map_err(|err| AppError::Checkpoint(format!("failed to serialize checkpoint: {err}")))?;
        body.push('\n');

        let mut tmp = NamedTempFile::new_in(parent).map_err(|err| {
            AppError::Checkpoint(format!("failed to create temporary file: {err}"))
        })?;
        tmp.write_all(body.as_bytes())
            .map_err(|err| AppError::Checkpoint(format!("failed to write temporary file: {err}")))?;
        tmp.as_file()
            .sync_all()
            .map_err(|err| AppError::Checkpoint(format!("failed to sync temporary file: {err}")))?;

        tmp.persist(&self.path).map_err(|err| {
            AppError::Checkpoint(format!(
                "failed to persist checkpoint to {}: {err}",
                self.path.display()
            ))
        })?;

        debug!(
            path = %self.path.display(),
            next_index = checkpoint.next_index,
            delivered = checkpoint.delivered.len(),
            "checkpoint saved"
        );
        Ok(())
    }
}
