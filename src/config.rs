//! Run configuration parsing, validation, and credential loading.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::{AppError, Result};

/// Config file consulted when no explicit path is given.
pub const DEFAULT_CONFIG_PATH: &str = "outreach.toml";

/// Keychain service name used for secret lookup.
const KEYRING_SERVICE: &str = "research-outreach";

/// Environment variable naming the spreadsheet to read contacts from.
pub const ENV_SHEET_ID: &str = "GOOGLE_SHEET_ID";
/// Environment variable holding the sender mailbox login.
pub const ENV_EMAIL_USERNAME: &str = "EMAIL_USERNAME";
/// Environment variable holding the sender mailbox password.
pub const ENV_EMAIL_PASSWORD: &str = "EMAIL_PASSWORD";
/// Environment variable holding the generator API key.
pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";
/// Environment variable pointing at the document attached to every message.
pub const ENV_CV_PATH: &str = "CV_PATH";

/// Language-model endpoint settings.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", default)]
pub struct GeneratorConfig {
    /// Chat model identifier.
    pub model: String,
    /// Base URL of the OpenAI-compatible API.
    pub api_base: String,
    /// Whole-request timeout for a single generation call.
    pub timeout_seconds: u64,
    /// API key (populated at runtime).
    #[serde(skip)]
    pub api_key: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            model: "gpt-3.5-turbo".into(),
            api_base: "https://api.openai.com/v1".into(),
            timeout_seconds: 120,
            api_key: String::new(),
        }
    }
}

/// Outgoing mail relay settings.
///
/// Credentials are loaded at runtime from the keychain or environment,
/// never from the TOML file.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", default)]
pub struct SmtpConfig {
    /// Relay host; the connection is upgraded with STARTTLS.
    pub host: String,
    /// Relay submission port.
    pub port: u16,
    /// Sender login, also used as the `From` address (populated at runtime).
    #[serde(skip)]
    pub username: String,
    /// Sender password (populated at runtime).
    #[serde(skip)]
    pub password: String,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: "smtp.gmail.com".into(),
            port: 587,
            username: String::new(),
            password: String::new(),
        }
    }
}

/// Google Sheets access settings.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", default)]
pub struct SheetsConfig {
    /// Base URL of the Sheets REST API.
    pub api_base: String,
    /// Service-account key file used to mint access tokens.
    pub service_account_path: PathBuf,
    /// Spreadsheet identifier (populated at runtime).
    #[serde(skip)]
    pub sheet_id: String,
}

impl Default for SheetsConfig {
    fn default() -> Self {
        Self {
            api_base: "https://sheets.googleapis.com/v4".into(),
            service_account_path: PathBuf::from("service_account.json"),
            sheet_id: String::new(),
        }
    }
}

fn default_sheet_range() -> String {
    "Sheet1!A2:D".into()
}

fn default_checkpoint_path() -> PathBuf {
    PathBuf::from("data/email_status.json")
}

fn default_emails_per_run() -> usize {
    10
}

fn default_courtesy_delay_seconds() -> u64 {
    30
}

fn default_profile_excerpt_chars() -> usize {
    500
}

fn default_profile_read_bytes() -> usize {
    5000
}

fn default_attachment_name() -> String {
    "CV.pdf".into()
}

/// Run configuration, built once at startup and passed by reference.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct OutreachConfig {
    /// A1-notation range holding contact rows (header row excluded).
    #[serde(default = "default_sheet_range")]
    pub sheet_range: String,
    /// Location of the persisted checkpoint.
    #[serde(default = "default_checkpoint_path")]
    pub checkpoint_path: PathBuf,
    /// Per-run quota: the window size.
    #[serde(default = "default_emails_per_run")]
    pub emails_per_run: usize,
    /// Pause after each successful send.
    #[serde(default = "default_courtesy_delay_seconds")]
    pub courtesy_delay_seconds: u64,
    /// Characters of the profile document handed to the generator.
    #[serde(default = "default_profile_excerpt_chars")]
    pub profile_excerpt_chars: usize,
    /// Bytes of the profile document read before decoding.
    #[serde(default = "default_profile_read_bytes")]
    pub profile_read_bytes: usize,
    /// File name the attachment is delivered under.
    #[serde(default = "default_attachment_name")]
    pub attachment_name: String,
    /// Document attached to every message (populated at runtime).
    #[serde(skip)]
    pub attachment_path: PathBuf,
    /// Language-model endpoint settings.
    #[serde(default)]
    pub generator: GeneratorConfig,
    /// Mail relay settings.
    #[serde(default)]
    pub smtp: SmtpConfig,
    /// Spreadsheet settings.
    #[serde(default)]
    pub sheets: SheetsConfig,
}

impl OutreachConfig {
    /// Load tunables from `path`, or from [`DEFAULT_CONFIG_PATH`] when it
    /// exists, or fall back to built-in defaults.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if an explicit file cannot be read, or if
    /// any file contains invalid TOML or fails validation.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load_from_path(path);
        }

        let fallback = Path::new(DEFAULT_CONFIG_PATH);
        if fallback.exists() {
            Self::load_from_path(fallback)
        } else {
            debug!("no config file found, using defaults");
            Self::from_toml_str("")
        }
    }

    /// Load and validate configuration from a TOML file path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read or contains
    /// invalid TOML, or if validation fails.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|err| {
            AppError::Config(format!("failed to read config {}: {err}", path.display()))
        })?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Load runtime values from the OS keychain and process environment.
    ///
    /// Secrets (`EMAIL_PASSWORD`, `OPENAI_API_KEY`) are looked up in the
    /// `research-outreach` keychain service first, then in the environment.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` naming every required value that is absent.
    pub async fn load_credentials(&mut self) -> Result<()> {
        let password = load_secret("email_password", ENV_EMAIL_PASSWORD).await?;
        let api_key = load_secret("openai_api_key", ENV_OPENAI_API_KEY).await?;

        self.apply_environment(|key| match key {
            ENV_EMAIL_PASSWORD => password.clone(),
            ENV_OPENAI_API_KEY => api_key.clone(),
            other => env::var(other).ok(),
        })
    }

    /// Populate runtime values through `lookup`.
    ///
    /// Blank values count as missing.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` naming every required value that is absent.
    pub fn apply_environment<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut missing: Vec<&str> = Vec::new();
        let mut take = |key: &'static str| -> String {
            if let Some(value) = lookup(key).filter(|v| !v.trim().is_empty()) {
                value
            } else {
                missing.push(key);
                String::new()
            }
        };

        let sheet_id = take(ENV_SHEET_ID);
        let username = take(ENV_EMAIL_USERNAME);
        let password = take(ENV_EMAIL_PASSWORD);
        let api_key = take(ENV_OPENAI_API_KEY);
        let attachment_path = take(ENV_CV_PATH);

        if !missing.is_empty() {
            return Err(AppError::Config(format!(
                "missing required configuration: {}",
                missing.join(", ")
            )));
        }

        self.sheets.sheet_id = sheet_id;
        self.smtp.username = username;
        self.smtp.password = password;
        self.generator.api_key = api_key;
        self.attachment_path = PathBuf::from(attachment_path);
        Ok(())
    }

    /// Pause applied after each successful send.
    #[must_use]
    pub fn courtesy_delay(&self) -> Duration {
        Duration::from_secs(self.courtesy_delay_seconds)
    }

    fn validate(&self) -> Result<()> {
        if self.emails_per_run == 0 {
            return Err(AppError::Config(
                "emails_per_run must be greater than zero".into(),
            ));
        }

        if self.attachment_name.trim().is_empty() {
            return Err(AppError::Config("attachment_name must not be empty".into()));
        }

        if self.sheet_range.trim().is_empty() {
            return Err(AppError::Config("sheet_range must not be empty".into()));
        }

        Ok(())
    }
}

/// Load a single secret from the OS keychain with env-var fallback.
async fn load_secret(keyring_key: &str, env_key: &str) -> Result<Option<String>> {
    let key = keyring_key.to_owned();

    // keyring is synchronous I/O.
    let keychain_result = tokio::task::spawn_blocking(move || {
        keyring::Entry::new(KEYRING_SERVICE, &key).and_then(|entry| entry.get_password())
    })
    .await
    .map_err(|err| AppError::Config(format!("keychain task panicked: {err}")))?;

    match keychain_result {
        Ok(value) if !value.is_empty() => return Ok(Some(value)),
        Ok(_) => {
            warn!(key = keyring_key, "keychain entry is empty, trying env var");
        }
        Err(err) => {
            debug!(key = keyring_key, ?err, "keychain lookup failed, trying env var");
        }
    }

    Ok(env::var(env_key).ok())
}
