//! The applicant's profile document: attached to every message and
//! excerpted into every generation prompt.

use std::fs;
use std::path::Path;

use tracing::info;

use crate::config::OutreachConfig;
use crate::dispatch::Attachment;
use crate::{AppError, Result};

/// Attachment bytes plus the text excerpt the generator sees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileDocument {
    /// File delivered with every message.
    pub attachment: Attachment,
    /// Leading text of the document, truncated for the prompt.
    pub excerpt: String,
}

impl ProfileDocument {
    /// Read the document named by the configuration's attachment path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Io` if the file cannot be read.
    pub fn load(config: &OutreachConfig) -> Result<Self> {
        let bytes = read_document(&config.attachment_path)?;
        let document = Self::from_bytes(
            bytes,
            &config.attachment_name,
            config.profile_read_bytes,
            config.profile_excerpt_chars,
        );
        info!(
            path = %config.attachment_path.display(),
            bytes = document.attachment.bytes.len(),
            "profile document loaded"
        );
        Ok(document)
    }

    /// Build from raw bytes: the first `read_bytes` bytes are decoded as
    /// UTF-8 with invalid sequences dropped, then cut to `excerpt_chars`
    /// characters.
    #[must_use]
    pub fn from_bytes(
        bytes: Vec<u8>,
        attachment_name: &str,
        read_bytes: usize,
        excerpt_chars: usize,
    ) -> Self {
        let head = &bytes[..bytes.len().min(read_bytes)];
        let excerpt: String = head
            .utf8_chunks()
            .flat_map(|chunk| chunk.valid().chars())
            .take(excerpt_chars)
            .collect();

        Self {
            attachment: Attachment::new(attachment_name, bytes),
            excerpt,
        }
    }
}

fn read_document(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|err| {
        AppError::Io(format!(
            "failed to read profile document {}: {err}",
            path.display()
        ))
    })
}
