//! Pinger
//!
//! Run with: pinger --settings settings.json
//!
//! Flags:
//! - --print-only: build and log emails without sending, with backoffs of seconds
//! - --send-test-email-and-exit: send one test email and quit
//!
//! Environment variables:
//! - RUST_LOG: Log level (default: info)

use std::path::PathBuf;

use clap::Parser;
use pinger::config::{Config, RunFlags};
use pinger::monitor::Monitor;
use pinger::notify::{EmailNotifier, MailjetTransport};
use pinger::probe::ShellProbe;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "pinger")]
#[command(about = "Probe a host and email escalating alerts while it is down")]
#[command(version)]
struct CliArgs {
    /// Path to the settings JSON file (API credentials, probe command, recipients)
    #[arg(long, alias = "credentials_json", value_name = "PATH")]
    settings: PathBuf,

    /// Just print, don't send any email, and reduce backoffs to a few seconds
    #[arg(long, alias = "print_only")]
    print_only: bool,

    /// Immediately send a test email and quit
    #[arg(long, alias = "send_test_email_and_exit")]
    send_test_email_and_exit: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pinger=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = CliArgs::parse();
    let flags = RunFlags {
        print_only: args.print_only,
        send_test_and_exit: args.send_test_email_and_exit,
    };

    let config = Config::load(&args.settings, flags)?;

    tracing::info!("Pinger configuration:");
    tracing::info!("  Command: {}", config.monitor.command);
    tracing::info!("  Backoff stages: {}", config.monitor.schedule.stage_count());
    tracing::info!("  Poll interval: {:?}", config.monitor.poll_interval);
    tracing::info!("  Probe timeout: {:?}", config.monitor.probe_timeout);
    tracing::info!("  Recipients: {}", config.mail.to.len());
    tracing::info!("  Print only: {}", config.mail.print_only);

    let transport = MailjetTransport::with_api_url(
        config.mail.api_key.clone(),
        config.mail.api_secret.clone(),
        config.mail.api_url.clone(),
    );
    let notifier = EmailNotifier::new(
        transport,
        config.mail.from.clone(),
        config.mail.to.clone(),
        config.mail.template.clone(),
    )
    .with_print_only(config.mail.print_only);

    let monitor = Monitor::new(config.monitor, ShellProbe::new(), notifier);
    monitor.run(shutdown_signal()).await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install CTRL+C signal handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
