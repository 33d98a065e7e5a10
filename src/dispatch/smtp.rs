//! SMTP dispatcher over a STARTTLS relay.

use std::future::Future;
use std::pin::Pin;

use lettre::message::header::ContentType;
use lettre::message::{Attachment as MailAttachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::info;

use super::{Attachment, Dispatcher};
use crate::config::SmtpConfig;
use crate::models::Contact;
use crate::{AppError, Result};

/// Sends mail through an authenticated SMTP relay.
pub struct SmtpDispatcher {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpDispatcher {
    /// Build the relay transport from configuration.
    ///
    /// No connection is opened until the first delivery.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the sender address is invalid or the
    /// relay host cannot be resolved into a TLS configuration.
    pub fn new(config: &SmtpConfig) -> Result<Self> {
        let from: Mailbox = config.username.parse().map_err(|err| {
            AppError::Config(format!("invalid sender address '{}': {err}", config.username))
        })?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|err| AppError::Config(format!("invalid smtp relay '{}': {err}", config.host)))?
            .port(config.port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .build();

        Ok(Self { transport, from })
    }

    async fn send(
        &self,
        contact: &Contact,
        subject: &str,
        body: &str,
        attachment: &Attachment,
    ) -> Result<()> {
        let message = build_message(&self.from, contact, subject, body, attachment)?;
        self.transport
            .send(message)
            .await
            .map_err(|err| AppError::Dispatch(format!("smtp send failed: {err}")))?;
        info!(name = %contact.name, email = %contact.email, "email sent");
        Ok(())
    }
}

impl Dispatcher for SmtpDispatcher {
    fn deliver<'a>(
        &'a self,
        contact: &'a Contact,
        subject: &'a str,
        body: &'a str,
        attachment: &'a Attachment,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(self.send(contact, subject, body, attachment))
    }
}

/// Assemble a `multipart/mixed` message: plain-text body first, then the
/// attachment.
///
/// # Errors
///
/// Returns `AppError::Dispatch` if the recipient address is invalid or the
/// message cannot be assembled.
pub fn build_message(
    from: &Mailbox,
    contact: &Contact,
    subject: &str,
    body: &str,
    attachment: &Attachment,
) -> Result<Message> {
    let address: Address = contact.email.trim().parse().map_err(|err| {
        AppError::Dispatch(format!("invalid recipient address '{}': {err}", contact.email))
    })?;
    let to = Mailbox::new(Some(contact.name.clone()), address);

    let content_type = ContentType::parse(&attachment.content_type).map_err(|err| {
        AppError::Dispatch(format!(
            "invalid attachment content type '{}': {err}",
            attachment.content_type
        ))
    })?;

    let parts = MultiPart::mixed()
        .singlepart(SinglePart::plain(body.to_owned()))
        .singlepart(
            MailAttachment::new(attachment.filename.clone())
                .body(attachment.bytes.clone(), content_type),
        );

    Message::builder()
        .from(from.clone())
        .to(to)
        .subject(subject)
        .multipart(parts)
        .map_err(|err| AppError::Dispatch(format!("failed to build message: {err}")))
}
