//! Error types shared across the application.

use std::fmt::{Display, Formatter};

/// Shared application result type.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error enumeration covering all domain failure modes.
#[derive(Debug)]
pub enum AppError {
    /// Configuration parsing, validation, or credential lookup failure.
    Config(String),
    /// Contact source (spreadsheet) unreachable or returned an unusable payload.
    Source(String),
    /// Message generation failed or produced a malformed reply.
    Generator(String),
    /// Mail transport rejected or failed to deliver a message.
    Dispatch(String),
    /// Checkpoint could not be persisted.
    Checkpoint(String),
    /// File-system or I/O operation failure.
    Io(String),
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Source(msg) => write!(f, "source: {msg}"),
            Self::Generator(msg) => write!(f, "generator: {msg}"),
            Self::Dispatch(msg) => write!(f, "dispatch: {msg}"),
            Self::Checkpoint(msg) => write!(f, "checkpoint: {msg}"),
            Self::Io(msg) => write!(f, "io: {msg}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(format!("invalid config: {err}"))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::Io(format!("invalid json: {err}"))
    }
}
