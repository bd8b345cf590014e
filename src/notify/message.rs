//! Email content

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

/// Why a notification is being sent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// One-off message confirming delivery works
    Test,
    /// The target has been failing
    Alert,
}

impl MessageKind {
    /// Check if this is a test message
    pub fn is_test(&self) -> bool {
        matches!(self, MessageKind::Test)
    }
}

/// Email address with optional display name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mailbox {
    #[serde(rename = "Email")]
    pub email: String,
    #[serde(rename = "Name", skip_serializing_if = "Option::is_none", default)]
    pub name: Option<String>,
}

impl Mailbox {
    /// Create a mailbox with no display name
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: None,
        }
    }

    /// Create a mailbox with a display name
    pub fn named(email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: Some(name.into()),
        }
    }
}

/// Fully composed email ready for a transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub from: Mailbox,
    pub to: Vec<Mailbox>,
    pub subject: String,
    pub text: String,
}

/// Fixed parts of every message
#[derive(Debug, Clone)]
pub struct MessageTemplate {
    pub subject: String,
    /// What is being probed, as readers of the email know it
    pub target: String,
    /// Name used to sign the message
    pub signature: String,
}

impl MessageTemplate {
    /// Plain-text body for a notification sent at `at`
    pub fn body(&self, kind: MessageKind, at: DateTime<Utc>) -> String {
        let when = format_timestamp(at);
        let main = match kind {
            MessageKind::Test => format!(
                "This is a test message at {when}\n\
                 If you're receiving this it just means the monitor for {target} is being tested.\n\
                 This was sent by {signature}.",
                when = when,
                target = self.target,
                signature = self.signature,
            ),
            MessageKind::Alert => format!(
                "PLEASE NOTE:\n\
                 {target} is likely UNREACHABLE (and has been for a while).\n\
                 \n\
                 The health check has been failing continuously. Please check that the \
                 host is powered on and connected to the network.\n\
                 \n\
                 This is an automated email set up by {signature}.\n\
                 Timestamp: {when}",
                target = self.target,
                signature = self.signature,
                when = when,
            ),
        };

        format!("Hi,\n\n{}\n\nCheers,\n{}\n", main, self.signature)
    }
}

/// Timestamp as shown in message bodies, in local time
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local)
        .format("%a %d %b %Y, %H:%M")
        .to_string()
}
