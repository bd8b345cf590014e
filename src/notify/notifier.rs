//! Notification handlers

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::message::{Email, Mailbox, MessageKind, MessageTemplate};

/// Sends a notification about the monitored target
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, at: DateTime<Utc>, kind: MessageKind) -> Result<(), NotifierError>;
}

/// Delivers a composed email
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn deliver(&self, email: &Email) -> Result<(), NotifierError>;
}

/// Builds notification emails and hands them to a transport.
///
/// In print-only mode the email is built and logged but the transport is
/// never called.
pub struct EmailNotifier<T> {
    transport: T,
    from: Mailbox,
    to: Vec<Mailbox>,
    template: MessageTemplate,
    print_only: bool,
}

impl<T: MailTransport> EmailNotifier<T> {
    /// Create a new notifier that sends through `transport`
    pub fn new(transport: T, from: Mailbox, to: Vec<Mailbox>, template: MessageTemplate) -> Self {
        Self {
            transport,
            from,
            to,
            template,
            print_only: false,
        }
    }

    /// Enable or disable print-only mode
    pub fn with_print_only(mut self, print_only: bool) -> Self {
        self.print_only = print_only;
        self
    }

    /// Check if print-only mode is enabled
    pub fn is_print_only(&self) -> bool {
        self.print_only
    }

    /// Get the underlying transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Compose the email for a notification
    pub fn compose(&self, at: DateTime<Utc>, kind: MessageKind) -> Email {
        Email {
            from: self.from.clone(),
            to: self.to.clone(),
            subject: self.template.subject.clone(),
            text: self.template.body(kind, at),
        }
    }
}

#[async_trait]
impl<T: MailTransport> Notifier for EmailNotifier<T> {
    async fn notify(&self, at: DateTime<Utc>, kind: MessageKind) -> Result<(), NotifierError> {
        let email = self.compose(at, kind);
        let recipients: Vec<&str> = email.to.iter().map(|m| m.email.as_str()).collect();

        tracing::info!(
            at = %at,
            test = kind.is_test(),
            from = %email.from.email,
            recipients = ?recipients,
            subject = %email.subject,
            "Would send now"
        );
        tracing::info!("Message content:\n{}", email.text);

        if self.print_only {
            tracing::info!("print_only option set, so not actually sending");
            return Ok(());
        }

        self.transport.deliver(&email).await
    }
}

/// Notifier errors
#[derive(Debug, thiserror::Error)]
pub enum NotifierError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Mail provider rejected message with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Serialization error: {0}")]
    Serialization(String),
}
