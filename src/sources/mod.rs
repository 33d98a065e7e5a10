//! Contact sources.
//!
//! A [`ContactSource`] returns the full contact list in a stable order.
//! Resumption relies on that order: the checkpoint stores a position, not
//! an identity.

pub mod google_auth;
pub mod sheets;

use std::future::Future;
use std::pin::Pin;

use crate::models::Contact;
use crate::Result;

/// Supplies the ordered contact list for a run.
pub trait ContactSource: Send + Sync {
    /// Fetch every contact, in the same order on every call against the
    /// same dataset.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Source` if the backing store is unreachable or
    /// returns an unusable payload.
    fn fetch_contacts(&self) -> Pin<Box<dyn Future<Output = Result<Vec<Contact>>> + Send + '_>>;
}

pub use sheets::SheetsContactSource;
