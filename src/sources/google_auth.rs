//! Service-account access tokens for Google APIs.
//!
//! Implements the OAuth 2.0 JWT bearer grant: an RS256-signed assertion is
//! exchanged at the key's `token_uri` for a short-lived access token.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{AppError, Result};

/// Read-only spreadsheet scope.
pub const SHEETS_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets.readonly";

const JWT_BEARER_GRANT: &str = "urn%3Aietf%3Aparams%3Aoauth%3Agrant-type%3Ajwt-bearer";
const ASSERTION_LIFETIME_SECONDS: i64 = 3600;

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".into()
}

/// The fields of a service-account key file this crate needs.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ServiceAccountKey {
    /// Service account identity, used as the assertion issuer.
    pub client_email: String,
    /// PEM-encoded RSA private key.
    pub private_key: String,
    /// Token endpoint the assertion is exchanged at.
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

impl ServiceAccountKey {
    /// Read a service-account key file.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file is missing or not a valid key.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|err| {
            AppError::Config(format!(
                "failed to read service account key {}: {err}",
                path.display()
            ))
        })?;
        Self::from_json_str(&raw)
    }

    /// Parse a service-account key from its JSON text.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if required fields are missing.
    pub fn from_json_str(raw: &str) -> Result<Self> {
        serde_json::from_str(raw)
            .map_err(|err| AppError::Config(format!("invalid service account key: {err}")))
    }

    /// Build the signed JWT assertion for `scope`, issued at `now`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the private key cannot be parsed or
    /// signing fails.
    pub fn signed_assertion(&self, scope: &str, now: DateTime<Utc>) -> Result<String> {
        let key = EncodingKey::from_rsa_pem(self.private_key.as_bytes())
            .map_err(|err| AppError::Config(format!("invalid service account private key: {err}")))?;
        let claims = Claims {
            iss: &self.client_email,
            scope,
            aud: &self.token_uri,
            iat: now.timestamp(),
            exp: (now + Duration::seconds(ASSERTION_LIFETIME_SECONDS)).timestamp(),
        };
        encode(&Header::new(Algorithm::RS256), &claims, &key)
            .map_err(|err| AppError::Config(format!("failed to sign token assertion: {err}")))
    }

    /// Exchange a fresh assertion for an access token.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Source` if the token endpoint is unreachable or
    /// rejects the assertion.
    pub async fn access_token(&self, client: &reqwest::Client, scope: &str) -> Result<String> {
        let assertion = self.signed_assertion(scope, Utc::now())?;
        // The assertion is base64url segments joined by '.', already form-safe.
        let form = format!("grant_type={JWT_BEARER_GRANT}&assertion={assertion}");

        let response = client
            .post(&self.token_uri)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(form)
            .send()
            .await
            .map_err(|err| AppError::Source(format!("token request failed: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Source(format!(
                "token endpoint returned {status}: {body}"
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|err| AppError::Source(format!("invalid token response: {err}")))?;
        debug!(client_email = %self.client_email, "obtained access token");
        Ok(token.access_token)
    }
}
