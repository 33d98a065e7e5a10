//! Personalized message generation.
//!
//! A [`MessageGenerator`] turns a contact plus the profile excerpt into a
//! subject and body. Replies are expected as a JSON object with `subject`
//! and `body`; anything else is a generation failure for that contact.

pub mod openai;

use std::future::Future;
use std::pin::Pin;

use serde::Deserialize;

use crate::models::Contact;
use crate::{AppError, Result};

/// A generated subject line and body.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct GeneratedMessage {
    /// Subject line.
    pub subject: String,
    /// Plain-text body.
    pub body: String,
}

/// Produces a personalized message for one contact.
pub trait MessageGenerator: Send + Sync {
    /// Generate a subject and body for `contact`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Generator` if the call fails or the reply is
    /// malformed or empty.
    fn generate<'a>(
        &'a self,
        contact: &'a Contact,
        profile_excerpt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<GeneratedMessage>> + Send + 'a>>;
}

pub use openai::OpenAiGenerator;

/// Render the instruction prompt for `contact`.
#[must_use]
pub fn build_prompt(contact: &Contact, profile_excerpt: &str) -> String {
    format!(
        "Create a personalized email for a summer research internship application to a professor.

Professor details:
Name: {name}
Research Domain: {domain}
University: {affiliation}

My CV highlights:
{profile_excerpt}...

Email requirements:
1. Subject Line: Specific and attention-grabbing
2. Salutation: Formal address
3. Introduction: Brief self-introduction
4. Why Them: Mention specific aspects of their research
5. My Qualifications: Highlight relevant skills and projects
6. Ask: Clearly state seeking a research internship
7. Mention CV attachment
8. Polite closing

Keep the email between 150-200 words. Make it personalized, mentioning specific research areas.
Format the response as a JSON with 'subject' and 'body' fields.",
        name = contact.name,
        domain = contact.research_domain,
        affiliation = contact.affiliation,
    )
}

/// Parse a model reply into a [`GeneratedMessage`].
///
/// Accepts a bare JSON object or one wrapped in a Markdown code fence.
///
/// # Errors
///
/// Returns `AppError::Generator` if the reply is not the expected JSON or
/// either field is blank.
pub fn parse_reply(content: &str) -> Result<GeneratedMessage> {
    let payload = strip_code_fence(content.trim());
    let message: GeneratedMessage = serde_json::from_str(payload)
        .map_err(|err| AppError::Generator(format!("unparsable reply: {err}")))?;

    if message.subject.trim().is_empty() {
        return Err(AppError::Generator("reply has an empty subject".into()));
    }
    if message.body.trim().is_empty() {
        return Err(AppError::Generator("reply has an empty body".into()));
    }

    Ok(GeneratedMessage {
        subject: message.subject.trim().to_owned(),
        body: message.body.trim().to_owned(),
    })
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the info string (e.g. `json`) on the opening line.
    let rest = rest.split_once('\n').map_or(rest, |(_, body)| body);
    rest.trim_end()
        .strip_suffix("```")
        .unwrap_or(rest)
        .trim()
}
