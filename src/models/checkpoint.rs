//! Resumption checkpoint persisted between runs.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Progress record enabling resumable batches.
///
/// `next_index` only moves forward and `delivered` only grows. The legacy
/// field names `last_index` / `sent_emails` are accepted on load so older
/// status files keep working, even alongside the current names.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", from = "CheckpointFile")]
pub struct Checkpoint {
    /// Position in the contact list where the next window starts.
    pub next_index: usize,
    /// Addresses that have been delivered to successfully.
    pub delivered: BTreeSet<String>,
    /// When the checkpoint was last written.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_run_at: Option<DateTime<Utc>>,
}

/// On-disk shape, tolerant of files that carry both current and legacy keys.
///
/// `next_index` wins over `last_index` when both are present; the two
/// delivered sets are merged so no recorded recipient is forgotten.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case", default)]
struct CheckpointFile {
    next_index: Option<usize>,
    last_index: Option<usize>,
    delivered: Option<BTreeSet<String>>,
    sent_emails: Option<BTreeSet<String>>,
    last_run_at: Option<DateTime<Utc>>,
}

impl From<CheckpointFile> for Checkpoint {
    fn from(file: CheckpointFile) -> Self {
        let mut delivered = file.delivered.unwrap_or_default();
        delivered.extend(file.sent_emails.unwrap_or_default());
        Self {
            next_index: file.next_index.or(file.last_index).unwrap_or_default(),
            delivered,
            last_run_at: file.last_run_at,
        }
    }
}

impl Checkpoint {
    /// Whether `email` has already been delivered to.
    #[must_use]
    pub fn is_delivered(&self, email: &str) -> bool {
        self.delivered.contains(email)
    }

    /// Record a successful delivery.
    ///
    /// Returns `false` if the address was already present.
    pub fn mark_delivered(&mut self, email: impl Into<String>) -> bool {
        self.delivered.insert(email.into())
    }

    /// Half-open window `[next_index, min(next_index + quota, len))`.
    ///
    /// Empty when the list is exhausted or shorter than `next_index`.
    #[must_use]
    pub fn window(&self, quota: usize, len: usize) -> std::ops::Range<usize> {
        let start = self.next_index.min(len);
        let end = self.next_index.saturating_add(quota).min(len);
        start..end.max(start)
    }

    /// Move `next_index` past the current window without ever moving it back.
    pub fn advance(&mut self, quota: usize, len: usize) {
        let target = self.next_index.saturating_add(quota).min(len);
        self.next_index = self.next_index.max(target);
    }
}
