//! Checkpoint persistence.
//!
//! The [`CheckpointStore`] trait is the runner's only access to durable
//! state. [`JsonCheckpointStore`] keeps a hand-editable JSON file on disk;
//! [`MemoryCheckpointStore`] holds state in memory for tests and dry runs.

pub mod json_store;
pub mod memory_store;

use crate::models::Checkpoint;
use crate::Result;

/// Loads and saves the resumption checkpoint.
pub trait CheckpointStore: Send + Sync {
    /// Return the persisted checkpoint.
    ///
    /// Absent or unreadable state yields [`Checkpoint::default`]; it is
    /// never an error.
    fn load(&self) -> Checkpoint;

    /// Replace the persisted checkpoint.
    ///
    /// A subsequent [`load`](Self::load) observes either the previous or the
    /// new value, never a partial write.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Checkpoint` if the storage location cannot be
    /// created or written.
    fn save(&self, checkpoint: &Checkpoint) -> Result<()>;
}

pub use json_store::JsonCheckpointStore;
pub use memory_store::MemoryCheckpointStore;
