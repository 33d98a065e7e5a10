//! Resumable, quota-bounded batch dispatch.
//!
//! Each run fetches the full contact list, processes the window
//! `[next_index, min(next_index + quota, len))` one contact at a time, then
//! advances `next_index` past the whole window and persists the checkpoint.
//!
//! A contact whose generation or delivery fails is *not* added to the
//! delivered set, but the window still moves past it, so it is attempted
//! once and never retried automatically. Removing the address from
//! `delivered` and lowering `next_index` in the checkpoint file forces a
//! retry.

use std::ops::Range;
use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};

use crate::config::OutreachConfig;
use crate::dispatch::Dispatcher;
use crate::generator::MessageGenerator;
use crate::models::{Checkpoint, Contact, DispatchOutcome};
use crate::persistence::CheckpointStore;
use crate::profile::ProfileDocument;
use crate::sources::ContactSource;
use crate::Result;

/// Default per-run quota.
pub const DEFAULT_QUOTA: usize = 10;

/// Default pause after each successful send.
pub const DEFAULT_COURTESY_DELAY: Duration = Duration::from_secs(30);

/// Tunables for a single run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSettings {
    /// Maximum number of contacts considered per run.
    pub quota: usize,
    /// Pause after a successful send before the next contact.
    pub courtesy_delay: Duration,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            quota: DEFAULT_QUOTA,
            courtesy_delay: DEFAULT_COURTESY_DELAY,
        }
    }
}

impl RunSettings {
    /// Settings taken from the run configuration.
    #[must_use]
    pub fn from_config(config: &OutreachConfig) -> Self {
        Self {
            quota: config.emails_per_run,
            courtesy_delay: config.courtesy_delay(),
        }
    }
}

/// A contact whose attempt failed during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactFailure {
    /// Recipient address.
    pub email: String,
    /// Why generation or delivery failed.
    pub reason: String,
}

/// Summary of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Size of the fetched contact list.
    pub total_contacts: usize,
    /// Positions processed this run.
    pub window: Range<usize>,
    /// Messages delivered (the processed count).
    pub sent: usize,
    /// Contacts skipped because they were already delivered.
    pub skipped: usize,
    /// Contacts whose attempt failed.
    pub failures: Vec<ContactFailure>,
    /// Where the next run will start.
    pub next_index: usize,
}

/// Orchestrates one run over injected collaborators.
pub struct BatchRunner<'a> {
    source: &'a dyn ContactSource,
    generator: &'a dyn MessageGenerator,
    dispatcher: &'a dyn Dispatcher,
    store: &'a dyn CheckpointStore,
    profile: &'a ProfileDocument,
    settings: RunSettings,
}

impl<'a> BatchRunner<'a> {
    /// Wire a runner to its collaborators.
    #[must_use]
    pub fn new(
        source: &'a dyn ContactSource,
        generator: &'a dyn MessageGenerator,
        dispatcher: &'a dyn Dispatcher,
        store: &'a dyn CheckpointStore,
        profile: &'a ProfileDocument,
        settings: RunSettings,
    ) -> Self {
        Self {
            source,
            generator,
            dispatcher,
            store,
            profile,
            settings,
        }
    }

    /// Execute one run: fetch, process the window, persist.
    ///
    /// The checkpoint is left untouched when the contact list is empty or
    /// already exhausted.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Source` if contacts cannot be fetched and
    /// `AppError::Checkpoint` if the updated checkpoint cannot be saved.
    /// Per-contact failures are reported in [`RunReport::failures`] instead.
    pub async fn run(&self) -> Result<RunReport> {
        let contacts = self.source.fetch_contacts().await?;
        if contacts.is_empty() {
            info!("no contacts found, nothing to do");
            return Ok(RunReport {
                next_index: self.store.load().next_index,
                ..RunReport::default()
            });
        }

        let checkpoint = self.store.load();
        let (checkpoint, report) = self.process_window(&contacts, checkpoint).await;

        if report.window.is_empty() {
            info!(
                next_index = report.next_index,
                total = report.total_contacts,
                "contact list exhausted, checkpoint unchanged"
            );
            return Ok(report);
        }

        self.store.save(&checkpoint)?;
        info!(
            sent = report.sent,
            skipped = report.skipped,
            failed = report.failures.len(),
            next_index = report.next_index,
            "run complete"
        );
        Ok(report)
    }

    /// Process the window selected by `checkpoint` and return the updated
    /// checkpoint alongside the report. Nothing is persisted here.
    pub async fn process_window(
        &self,
        contacts: &[Contact],
        mut checkpoint: Checkpoint,
    ) -> (Checkpoint, RunReport) {
        let window = checkpoint.window(self.settings.quota, contacts.len());
        let mut report = RunReport {
            total_contacts: contacts.len(),
            window: window.clone(),
            ..RunReport::default()
        };

        if window.is_empty() {
            report.next_index = checkpoint.next_index;
            return (checkpoint, report);
        }

        info!(
            start = window.start,
            end = window.end,
            total = contacts.len(),
            "processing window"
        );

        let last = window.end - 1;
        for index in window.clone() {
            let contact = &contacts[index];
            match self.process_contact(contact, &checkpoint).await {
                DispatchOutcome::Sent => {
                    checkpoint.mark_delivered(contact.email.clone());
                    report.sent += 1;
                    if index < last && !self.settings.courtesy_delay.is_zero() {
                        tokio::time::sleep(self.settings.courtesy_delay).await;
                    }
                }
                DispatchOutcome::SkippedAlreadyDelivered => {
                    info!(email = %contact.email, "already delivered, skipping");
                    report.skipped += 1;
                }
                DispatchOutcome::Failed(reason) => {
                    warn!(name = %contact.name, email = %contact.email, %reason, "failed to send email");
                    report.failures.push(ContactFailure {
                        email: contact.email.clone(),
                        reason,
                    });
                }
            }
        }

        checkpoint.advance(self.settings.quota, contacts.len());
        checkpoint.last_run_at = Some(Utc::now());
        report.next_index = checkpoint.next_index;
        (checkpoint, report)
    }

    async fn process_contact(&self, contact: &Contact, checkpoint: &Checkpoint) -> DispatchOutcome {
        if checkpoint.is_delivered(&contact.email) {
            return DispatchOutcome::SkippedAlreadyDelivered;
        }

        let message = match self
            .generator
            .generate(contact, &self.profile.excerpt)
            .await
        {
            Ok(message) => message,
            Err(err) => return DispatchOutcome::Failed(err.to_string()),
        };

        match self
            .dispatcher
            .deliver(
                contact,
                &message.subject,
                &message.body,
                &self.profile.attachment,
            )
            .await
        {
            Ok(()) => DispatchOutcome::Sent,
            Err(err) => DispatchOutcome::Failed(err.to_string()),
        }
    }
}
