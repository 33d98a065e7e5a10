//! Google Sheets contact source.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use reqwest::{Client, Url};
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::google_auth::{ServiceAccountKey, SHEETS_READONLY_SCOPE};
use super::ContactSource;
use crate::config::OutreachConfig;
use crate::models::Contact;
use crate::{AppError, Result};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Body of a `spreadsheets.values.get` response.
///
/// Google omits `values` entirely when the range is empty.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ValueRange {
    /// Range actually returned, in A1 notation.
    #[serde(default)]
    pub range: Option<String>,
    /// Row-major cell values (formatted as strings).
    #[serde(default)]
    pub values: Vec<Vec<String>>,
}

impl ValueRange {
    /// Map rows to contacts in sheet order, dropping rows with fewer than
    /// three cells.
    #[must_use]
    pub fn into_contacts(self) -> Vec<Contact> {
        let total = self.values.len();
        let contacts: Vec<Contact> = self
            .values
            .iter()
            .filter_map(|row| Contact::from_row(row))
            .collect();

        let dropped = total - contacts.len();
        if dropped > 0 {
            warn!(dropped, "ignored spreadsheet rows with fewer than three cells");
        }
        contacts
    }
}

/// Reads contacts from a spreadsheet range with a service-account token.
pub struct SheetsContactSource {
    client: Client,
    values_url: Url,
    credentials: ServiceAccountKey,
}

impl std::fmt::Debug for SheetsContactSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SheetsContactSource")
            .field("values_url", &self.values_url.as_str())
            .field("client_email", &self.credentials.client_email)
            .finish_non_exhaustive()
    }
}

impl SheetsContactSource {
    /// Build a source from the run configuration.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the service-account key cannot be
    /// loaded, the API base URL is invalid, or the HTTP client cannot be
    /// built.
    pub fn new(config: &OutreachConfig) -> Result<Self> {
        let credentials = ServiceAccountKey::load(&config.sheets.service_account_path)?;
        let values_url = values_url(
            &config.sheets.api_base,
            &config.sheets.sheet_id,
            &config.sheet_range,
        )?;
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(format!("research-outreach/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| AppError::Config(format!("failed to create HTTP client: {err}")))?;

        Ok(Self {
            client,
            values_url,
            credentials,
        })
    }

    async fn fetch(&self) -> Result<Vec<Contact>> {
        let token = self
            .credentials
            .access_token(&self.client, SHEETS_READONLY_SCOPE)
            .await?;

        debug!(url = %self.values_url, "fetching contact rows");
        let response = self
            .client
            .get(self.values_url.clone())
            .bearer_auth(token)
            .send()
            .await
            .map_err(|err| AppError::Source(format!("sheets request failed: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Source(format!("sheets returned {status}: {body}")));
        }

        let range: ValueRange = response
            .json()
            .await
            .map_err(|err| AppError::Source(format!("invalid sheets response: {err}")))?;

        if range.values.is_empty() {
            info!("no data found in the spreadsheet range");
        }
        Ok(range.into_contacts())
    }
}

impl ContactSource for SheetsContactSource {
    fn fetch_contacts(&self) -> Pin<Box<dyn Future<Output = Result<Vec<Contact>>> + Send + '_>> {
        Box::pin(self.fetch())
    }
}

/// Build `{api_base}/spreadsheets/{sheet_id}/values/{range}` with each
/// segment percent-encoded.
///
/// # Errors
///
/// Returns `AppError::Config` if `api_base` is not a valid base URL.
pub fn values_url(api_base: &str, sheet_id: &str, range: &str) -> Result<Url> {
    let mut url = Url::parse(api_base)
        .map_err(|err| AppError::Config(format!("invalid sheets api_base '{api_base}': {err}")))?;
    url.path_segments_mut()
        .map_err(|()| AppError::Config(format!("sheets api_base '{api_base}' cannot be a base")))?
        .pop_if_empty()
        .extend(["spreadsheets", sheet_id, "values", range]);
    Ok(url)
}
