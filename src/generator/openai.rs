//! OpenAI-compatible chat-completions generator.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{build_prompt, parse_reply, GeneratedMessage, MessageGenerator};
use crate::config::GeneratorConfig;
use crate::models::Contact;
use crate::{AppError, Result};

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// Generates messages with a single-turn chat completion.
pub struct OpenAiGenerator {
    client: Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl std::fmt::Debug for OpenAiGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiGenerator")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl OpenAiGenerator {
    /// Build a generator from configuration.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the HTTP client cannot be built.
    pub fn new(config: &GeneratorConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(format!("research-outreach/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| AppError::Config(format!("failed to create HTTP client: {err}")))?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", config.api_base.trim_end_matches('/')),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
        })
    }

    async fn complete(&self, contact: &Contact, profile_excerpt: &str) -> Result<GeneratedMessage> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user".into(),
                content: Some(build_prompt(contact, profile_excerpt)),
            }],
        };

        debug!(email = %contact.email, model = %self.model, "requesting completion");
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|err| AppError::Generator(format!("completion request failed: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Generator(format!(
                "completion endpoint returned {status}: {body}"
            )));
        }

        let completion: ChatResponse = response
            .json()
            .await
            .map_err(|err| AppError::Generator(format!("invalid completion response: {err}")))?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| AppError::Generator("completion has no message content".into()))?;

        parse_reply(&content)
    }
}

impl MessageGenerator for OpenAiGenerator {
    fn generate<'a>(
        &'a self,
        contact: &'a Contact,
        profile_excerpt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<GeneratedMessage>> + Send + 'a>> {
        Box::pin(self.complete(contact, profile_excerpt))
    }
}
