//! Notifications sent while the target is down
//!
//! The monitor only decides when to notify and whether the message is a
//! test. Composing the email and delivering it live here.

pub mod mailjet;
pub mod message;
pub mod notifier;

pub use mailjet::MailjetTransport;
pub use message::{Email, Mailbox, MessageKind, MessageTemplate};
pub use notifier::{EmailNotifier, MailTransport, Notifier, NotifierError};
