//! Configuration
//!
//! Settings are read from a JSON file:
//!
//! ```json
//! {
//!     "api_key": "xxx",
//!     "api_secret": "yyy",
//!     "from": "monitor@example.com",
//!     "cmd": "ping -c4 -w12 192.168.1.2",
//!     "addresses_to": ["a@example.com", "b@example.com"]
//! }
//! ```
//!
//! Optional keys: `sender_name`, `subject`, `target`, `backoff_secs`,
//! `poll_interval_secs`, `probe_timeout_secs`, `api_url`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::monitor::{BackoffSchedule, ScheduleError};
use crate::notify::mailjet::DEFAULT_API_URL;
use crate::notify::{Mailbox, MessageTemplate};

const HOUR: u64 = 60 * 60;

/// Delays between alerts: first after 6h of failure, then 12h, then every 24h
pub const DEFAULT_BACKOFF_SECS: [u64; 3] = [6 * HOUR, 12 * HOUR, 24 * HOUR];

/// Shortened delays used with print-only runs
pub const PRINT_ONLY_BACKOFF_SECS: [u64; 2] = [10, 20];

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(15);

const DEFAULT_SENDER_NAME: &str = "Pinger";
const DEFAULT_SUBJECT: &str = "Monitored host is unreachable";

/// On-disk settings file
#[derive(Debug, Clone, Deserialize)]
pub struct SettingsFile {
    pub api_key: String,
    pub api_secret: String,
    /// Sender address
    pub from: String,
    /// Probe command, run through the shell
    pub cmd: String,
    pub addresses_to: Vec<String>,
    #[serde(default)]
    pub sender_name: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    /// Description of the probed target used in message bodies
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub backoff_secs: Option<Vec<u64>>,
    #[serde(default)]
    pub poll_interval_secs: Option<u64>,
    #[serde(default)]
    pub probe_timeout_secs: Option<u64>,
    #[serde(default)]
    pub api_url: Option<String>,
}

impl SettingsFile {
    /// Read and parse a settings file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&raw)
    }

    /// Parse settings from JSON text
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }
}

/// Command-line switches that affect configuration
#[derive(Debug, Clone, Copy, Default)]
pub struct RunFlags {
    /// Build and log notifications without sending them
    pub print_only: bool,
    /// Send one test notification and exit
    pub send_test_and_exit: bool,
}

/// Settings for the monitoring loop
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub command: String,
    pub schedule: BackoffSchedule,
    pub poll_interval: Duration,
    pub probe_timeout: Duration,
    pub send_test_and_exit: bool,
}

impl MonitorConfig {
    /// Create a monitor config with the default poll interval and probe timeout
    pub fn new(command: impl Into<String>, schedule: BackoffSchedule) -> Self {
        Self {
            command: command.into(),
            schedule,
            poll_interval: DEFAULT_POLL_INTERVAL,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            send_test_and_exit: false,
        }
    }

    /// Set poll interval
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set probe timeout
    pub fn with_probe_timeout(mut self, limit: Duration) -> Self {
        self.probe_timeout = limit;
        self
    }

    /// Enable/disable test mode
    pub fn with_send_test_and_exit(mut self, enabled: bool) -> Self {
        self.send_test_and_exit = enabled;
        self
    }
}

/// Settings for email notifications
#[derive(Debug, Clone)]
pub struct MailConfig {
    pub api_key: String,
    pub api_secret: String,
    pub api_url: String,
    pub from: Mailbox,
    pub to: Vec<Mailbox>,
    pub template: MessageTemplate,
    pub print_only: bool,
}

/// Validated configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub monitor: MonitorConfig,
    pub mail: MailConfig,
}

impl Config {
    /// Load and validate a settings file
    pub fn load(path: &Path, flags: RunFlags) -> Result<Self, ConfigError> {
        Self::from_settings(SettingsFile::load(path)?, flags)
    }

    /// Validate parsed settings and apply defaults
    pub fn from_settings(settings: SettingsFile, flags: RunFlags) -> Result<Self, ConfigError> {
        let command = settings.cmd.trim().to_string();
        if command.is_empty() {
            return Err(ConfigError::EmptyCommand);
        }

        let backoff_secs = match &settings.backoff_secs {
            Some(secs) => secs.clone(),
            None if flags.print_only => PRINT_ONLY_BACKOFF_SECS.to_vec(),
            None => DEFAULT_BACKOFF_SECS.to_vec(),
        };
        let schedule = BackoffSchedule::from_secs(&backoff_secs)?;

        let poll_interval = match settings.poll_interval_secs {
            Some(0) => return Err(ConfigError::InvalidInterval("poll_interval_secs")),
            Some(secs) => Duration::from_secs(secs),
            None => DEFAULT_POLL_INTERVAL,
        };
        let probe_timeout = match settings.probe_timeout_secs {
            Some(0) => return Err(ConfigError::InvalidInterval("probe_timeout_secs")),
            Some(secs) => Duration::from_secs(secs),
            None => DEFAULT_PROBE_TIMEOUT,
        };

        if settings.addresses_to.is_empty() {
            tracing::warn!("0 'To' email addresses given");
        }

        let sender_name = settings
            .sender_name
            .unwrap_or_else(|| DEFAULT_SENDER_NAME.to_string());

        let template = MessageTemplate {
            subject: settings
                .subject
                .unwrap_or_else(|| DEFAULT_SUBJECT.to_string()),
            target: settings.target.unwrap_or_else(|| command.clone()),
            signature: sender_name.clone(),
        };

        let monitor = MonitorConfig::new(command, schedule)
            .with_poll_interval(poll_interval)
            .with_probe_timeout(probe_timeout)
            .with_send_test_and_exit(flags.send_test_and_exit);

        let mail = MailConfig {
            api_key: settings.api_key,
            api_secret: settings.api_secret,
            api_url: settings
                .api_url
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            from: Mailbox::named(settings.from, sender_name),
            to: settings.addresses_to.into_iter().map(Mailbox::new).collect(),
            template,
            print_only: flags.print_only,
        };

        Ok(Self { monitor, mail })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid settings file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Probe command is empty")]
    EmptyCommand,

    #[error("Invalid backoff schedule: {0}")]
    Schedule(#[from] ScheduleError),

    #[error("{0} must be greater than zero")]
    InvalidInterval(&'static str),
}
