//! Per-contact dispatch result.

/// Result of processing one contact inside a window.
///
/// Outcomes are transient: only their effect on the checkpoint is persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Message generated and delivered.
    Sent,
    /// Address was already in the delivered set; nothing was called.
    SkippedAlreadyDelivered,
    /// Generation or delivery failed; the address stays undelivered.
    Failed(String),
}
