//! Shared in-memory collaborators for runner-level integration tests.
//!
//! Each fake records the calls it receives so tests can assert on exactly
//! which contacts reached the generator and the dispatcher.

use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;
use std::time::Duration;

use research_outreach::dispatch::{Attachment, Dispatcher};
use research_outreach::generator::{GeneratedMessage, MessageGenerator};
use research_outreach::models::Contact;
use research_outreach::persistence::CheckpointStore;
use research_outreach::profile::ProfileDocument;
use research_outreach::sources::ContactSource;
use research_outreach::{AppError, BatchRunner, Result, RunSettings};

/// Build a contact whose fields derive from a single letter.
pub fn contact(tag: &str) -> Contact {
    Contact::new(
        format!("Prof. {tag}"),
        format!("Topic {tag}"),
        format!("{}@uni.example", tag.to_lowercase()),
        "Example University",
    )
}

/// Build contacts for each tag in order.
pub fn contacts(tags: &[&str]) -> Vec<Contact> {
    tags.iter().map(|tag| contact(tag)).collect()
}

/// Small profile document with a predictable excerpt.
pub fn profile() -> ProfileDocument {
    ProfileDocument::from_bytes(b"Jane Doe - ML researcher".to_vec(), "CV.pdf", 5000, 500)
}

/// Run settings with no courtesy delay.
pub fn settings(quota: usize) -> RunSettings {
    RunSettings {
        quota,
        courtesy_delay: Duration::ZERO,
    }
}

/// Contact source returning a fixed list, or an error when `unreachable`.
#[derive(Default)]
pub struct FixedSource {
    pub contacts: Vec<Contact>,
    pub unreachable: bool,
}

impl FixedSource {
    pub fn new(contacts: Vec<Contact>) -> Self {
        Self {
            contacts,
            unreachable: false,
        }
    }
}

impl ContactSource for FixedSource {
    fn fetch_contacts(&self) -> Pin<Box<dyn Future<Output = Result<Vec<Contact>>> + Send + '_>> {
        Box::pin(async move {
            if self.unreachable {
                Err(AppError::Source("sheet unreachable".into()))
            } else {
                Ok(self.contacts.clone())
            }
        })
    }
}

/// Generator that fails for configured addresses and records every call.
#[derive(Default)]
pub struct FakeGenerator {
    pub failing: HashSet<String>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeGenerator {
    pub fn failing_for(emails: &[&str]) -> Self {
        Self {
            failing: emails.iter().map(|e| (*e).to_owned()).collect(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl MessageGenerator for FakeGenerator {
    fn generate<'a>(
        &'a self,
        contact: &'a Contact,
        profile_excerpt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<GeneratedMessage>> + Send + 'a>> {
        Box::pin(async move {
            self.calls.lock().unwrap().push(contact.email.clone());
            if self.failing.contains(&contact.email) {
                return Err(AppError::Generator("unparsable reply: expected value".into()));
            }
            Ok(GeneratedMessage {
                subject: format!("Internship inquiry: {}", contact.research_domain),
                body: format!("Dear {}, {profile_excerpt}", contact.name),
            })
        })
    }
}

/// Dispatcher that fails for configured addresses and records deliveries.
#[derive(Default)]
pub struct RecordingDispatcher {
    pub failing: HashSet<String>,
    pub attempts: Mutex<Vec<String>>,
    pub delivered: Mutex<Vec<(String, String, String)>>,
}

impl RecordingDispatcher {
    pub fn failing_for(emails: &[&str]) -> Self {
        Self {
            failing: emails.iter().map(|e| (*e).to_owned()).collect(),
            ..Self::default()
        }
    }

    pub fn attempts(&self) -> Vec<String> {
        self.attempts.lock().unwrap().clone()
    }

    pub fn delivered_to(&self) -> Vec<String> {
        self.delivered
            .lock()
            .unwrap()
            .iter()
            .map(|(email, _, _)| email.clone())
            .collect()
    }
}

impl Dispatcher for RecordingDispatcher {
    fn deliver<'a>(
        &'a self,
        contact: &'a Contact,
        subject: &'a str,
        _body: &'a str,
        attachment: &'a Attachment,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            self.attempts.lock().unwrap().push(contact.email.clone());
            if self.failing.contains(&contact.email) {
                return Err(AppError::Dispatch("smtp send failed: 550 mailbox unavailable".into()));
            }
            self.delivered.lock().unwrap().push((
                contact.email.clone(),
                subject.to_owned(),
                attachment.filename.clone(),
            ));
            Ok(())
        })
    }
}

/// Run once with the given collaborators.
pub async fn run_once(
    source: &FixedSource,
    generator: &FakeGenerator,
    dispatcher: &RecordingDispatcher,
    store: &dyn CheckpointStore,
    quota: usize,
) -> Result<research_outreach::RunReport> {
    run_with_settings(source, generator, dispatcher, store, settings(quota)).await
}

/// Run once with explicit settings, e.g. a non-zero courtesy delay.
pub async fn run_with_settings(
    source: &FixedSource,
    generator: &FakeGenerator,
    dispatcher: &RecordingDispatcher,
    store: &dyn CheckpointStore,
    settings: RunSettings,
) -> Result<research_outreach::RunReport> {
    let profile = profile();
    BatchRunner::new(source, generator, dispatcher, store, &profile, settings)
        .run()
        .await
}
