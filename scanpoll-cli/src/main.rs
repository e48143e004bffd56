//! Scanpoll CLI
//!
//! Waits for the latest run of a ScanCode.io project to finish.
//!
//! Exit codes:
//! - 0: run succeeded; outcome printed as one JSON line on stdout
//! - 1: run ended in a failure state; project dumped to stderr
//! - 2: missing or invalid configuration
//! - 124: no terminal state before the timeout

mod config;
mod poller;
mod report;

use clap::Parser;
use scanpoll_client::ScanCodeClient;
use std::io;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{Config, ConfigArgs};
use crate::poller::Poller;
use crate::report::ExitOutcome;

#[derive(Parser)]
#[command(name = "scanpoll", version)]
#[command(about = "Poll a ScanCode.io project until its latest run finishes", long_about = None)]
struct Cli {
    #[command(flatten)]
    config: ConfigArgs,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Logs go to stderr; stdout carries only the result line
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "scanpoll=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_target(false),
        )
        .init();

    let cli = Cli::parse();

    let config = match Config::from_args(cli.config) {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            return ExitOutcome::ConfigError.into();
        }
    };

    run(config).await.into()
}

async fn run(config: Config) -> ExitOutcome {
    let client =
        match ScanCodeClient::new(&config.base_url, &config.token, config.request_timeout) {
            Ok(client) => client,
            Err(e) => {
                error!("Failed to create ScanCode.io client: {}", e);
                return ExitOutcome::ConfigError;
            }
        };

    info!(
        "Polling ScanCode.io project {} @ {} every {:.0}s (timeout {:.0}s)",
        config.project_uuid,
        config.base_url,
        config.poll_interval.as_secs_f64(),
        config.timeout.as_secs_f64()
    );

    let mut poller = Poller::new(client, &config);
    let outcome = poller.run().await;

    report::finish(
        outcome,
        config.ci_output.as_deref(),
        &mut io::stdout(),
        &mut io::stderr(),
    )
}
