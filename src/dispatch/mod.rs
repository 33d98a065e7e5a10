//! Message delivery.

pub mod smtp;

use std::future::Future;
use std::path::Path;
use std::pin::Pin;

use crate::models::Contact;
use crate::Result;

/// File delivered alongside a message body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// File name presented to the recipient.
    pub filename: String,
    /// MIME type, derived from the file name.
    pub content_type: String,
    /// Raw file contents.
    pub bytes: Vec<u8>,
}

impl Attachment {
    /// Create an attachment, inferring the MIME type from `filename`.
    #[must_use]
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        let filename = filename.into();
        let content_type = content_type_for(&filename).to_owned();
        Self {
            filename,
            content_type,
            bytes,
        }
    }
}

fn content_type_for(filename: &str) -> &'static str {
    let extension = Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("pdf") => "application/pdf",
        Some("txt") => "text/plain",
        Some("doc") => "application/msword",
        Some("docx") => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        _ => "application/octet-stream",
    }
}

/// Delivers one fully-formed message.
///
/// Delivery is all-or-nothing: headers, body and attachment reach the
/// transport together or the call fails.
pub trait Dispatcher: Send + Sync {
    /// Send `subject` / `body` with `attachment` to `contact`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Dispatch` if the message cannot be built or the
    /// transport rejects it.
    fn deliver<'a>(
        &'a self,
        contact: &'a Contact,
        subject: &'a str,
        body: &'a str,
        attachment: &'a Attachment,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;
}

pub use smtp::SmtpDispatcher;
