//! Contact model and spreadsheet row mapping.

use serde::{Deserialize, Serialize};

/// Affiliation used when the source row leaves the column blank or absent.
pub const UNKNOWN_AFFILIATION: &str = "Unknown";

/// A person to reach out to, with the research metadata used for
/// personalization.
///
/// `email` is the deduplication key across runs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct Contact {
    /// Display name used in the salutation.
    pub name: String,
    /// Research area the message should reference.
    pub research_domain: String,
    /// Recipient address.
    pub email: String,
    /// Institution the contact belongs to.
    pub affiliation: String,
}

impl Contact {
    /// Construct a contact with an explicit affiliation.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        research_domain: impl Into<String>,
        email: impl Into<String>,
        affiliation: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            research_domain: research_domain.into(),
            email: email.into(),
            affiliation: affiliation.into(),
        }
    }

    /// Map one spreadsheet row (`name, research_domain, email[, affiliation]`)
    /// into a contact.
    ///
    /// Cells are trimmed, so an address typed with stray whitespace still
    /// matches its delivered-set entry. Returns `None` for rows with fewer
    /// than three cells.
    #[must_use]
    pub fn from_row(row: &[String]) -> Option<Self> {
        let [name, research_domain, email, rest @ ..] = row else {
            return None;
        };
        let affiliation = rest
            .first()
            .map(String::as_str)
            .map(str::trim)
            .filter(|cell| !cell.is_empty())
            .unwrap_or(UNKNOWN_AFFILIATION);
        Some(Self::new(
            name.trim(),
            research_domain.trim(),
            email.trim(),
            affiliation,
        ))
    }
}
