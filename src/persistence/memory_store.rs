//! In-memory checkpoint store.

use std::sync::Mutex;

use super::CheckpointStore;
use crate::models::Checkpoint;
use crate::{AppError, Result};

/// Holds the checkpoint in process memory; nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryCheckpointStore {
    state: Mutex<Checkpoint>,
    saves: Mutex<usize>,
}

impl MemoryCheckpointStore {
    /// Create a store seeded with `checkpoint`.
    #[must_use]
    pub fn with_checkpoint(checkpoint: Checkpoint) -> Self {
        Self {
            state: Mutex::new(checkpoint),
            saves: Mutex::new(0),
        }
    }

    /// Number of successful [`save`](CheckpointStore::save) calls.
    #[must_use]
    pub fn save_count(&self) -> usize {
        self.saves.lock().map_or(0, |guard| *guard)
    }
}

impl CheckpointStore for MemoryCheckpointStore {
    fn load(&self) -> Checkpoint {
        self.state
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    fn save(&self, checkpoint: &Checkpoint) -> Result<()> {
        let mut guard = self
            .state
            .lock()
            .map_err(|_| AppError::Checkpoint("checkpoint mutex poisoned".into()))?;
        *guard = checkpoint.clone();
        drop(guard);

        let mut saves = self
            .saves
            .lock()
            .map_err(|_| AppError::Checkpoint("checkpoint mutex poisoned".into()))?;
        *saves += 1;
        Ok(())
    }
}
