//! Pinger: liveness monitor with escalating email alerts
//!
//! Runs a health-check command at a fixed interval. While the check keeps
//! failing, alerts are emailed on a backoff schedule measured from the
//! previous alert, so a long outage does not flood the recipients.
//!
//! # Features
//!
//! - **Shell probes**: any command, bounded by a timeout
//! - **Escalating alerts**: e.g. after 6h, then 12h later, then every 24h
//! - **Recovery reset**: a successful probe clears the escalation
//! - **Print-only mode**: build and log emails without sending them
//! - **Test mode**: send one test email and exit
//!
//! # Example
//!
//! ```no_run
//! use pinger::config::MonitorConfig;
//! use pinger::monitor::{BackoffSchedule, Monitor};
//! use pinger::notify::{EmailNotifier, Mailbox, MailjetTransport, MessageTemplate};
//! use pinger::probe::ShellProbe;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let schedule = BackoffSchedule::from_secs(&[10, 20])?;
//! let config = MonitorConfig::new("ping -c1 192.168.1.2", schedule);
//!
//! let notifier = EmailNotifier::new(
//!     MailjetTransport::new("key", "secret"),
//!     Mailbox::named("monitor@example.com", "Pinger"),
//!     vec![Mailbox::new("admin@example.com")],
//!     MessageTemplate {
//!         subject: "Host is down".to_string(),
//!         target: "192.168.1.2".to_string(),
//!         signature: "Pinger".to_string(),
//!     },
//! )
//! .with_print_only(true);
//!
//! Monitor::new(config, ShellProbe::new(), notifier)
//!     .run(async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     })
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod monitor;
pub mod notify;
pub mod probe;

// Re-export commonly used types
pub use config::{Config, ConfigError, RunFlags};
pub use monitor::{BackoffSchedule, EscalationTimer, Monitor, MonitorError, Status};
pub use notify::{Notifier, NotifierError};
pub use probe::{Probe, ProbeOutcome, ShellProbe};
