//! mdrkit - maintenance commands against an MDR deployment
//!
//! Configuration comes from the environment (optionally a `.env` file) or a
//! config file, see `mdrkit_infra::config`.

use std::process::ExitCode;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use mdrkit_domain::constants::DEFAULT_EXCLUDE_KEY;
use mdrkit_lib::utils::logging::{error_label, init_tracing_with_dotenv, log_operation};
use mdrkit_lib::MdrManager;

const USAGE: &str = "\
Usage: mdrkit <command>

Commands:
  cleanup-sessions [exclude_key]  Delete robot sessions except those whose name contains exclude_key (default \"~\")
  cleanup-extra-sessions          Delete every session except the portal's own
  delete-organization             Delete the configured client's organization
  help                            Show this message";

enum Command {
    CleanupSessions(String),
    CleanupExtraSessions,
    DeleteOrganization,
    Help,
}

impl Command {
    fn parse(mut args: impl Iterator<Item = String>) -> Result<Self> {
        let Some(name) = args.next() else {
            return Ok(Self::Help);
        };
        match name.as_str() {
            "cleanup-sessions" => Ok(Self::CleanupSessions(
                args.next().unwrap_or_else(|| DEFAULT_EXCLUDE_KEY.to_string()),
            )),
            "cleanup-extra-sessions" => Ok(Self::CleanupExtraSessions),
            "delete-organization" => Ok(Self::DeleteOrganization),
            "help" | "-h" | "--help" => Ok(Self::Help),
            other => bail!("unknown command: {other}"),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::CleanupSessions(_) => "cleanup-sessions",
            Self::CleanupExtraSessions => "cleanup-extra-sessions",
            Self::DeleteOrganization => "delete-organization",
            Self::Help => "help",
        }
    }
}

async fn run(command: Command) -> Result<()> {
    let config = mdrkit_infra::config::load().context("failed to load configuration")?;
    let manager = MdrManager::connect(config).await.context("login failed")?;

    let started = Instant::now();
    let outcome = match &command {
        Command::CleanupSessions(exclude_key) => {
            manager.delete_sessions(&[], exclude_key).await.map(|deleted| {
                tracing::info!(deleted, "sessions deleted");
            })
        }
        Command::CleanupExtraSessions => manager.delete_extra_sessions().await.map(|deleted| {
            tracing::info!(deleted, "sessions deleted");
        }),
        Command::DeleteOrganization => manager.delete_organizations().await,
        Command::Help => Ok(()),
    };
    log_operation(command.name(), started.elapsed(), outcome.is_ok());

    if let Err(err) = &outcome {
        tracing::error!(error = %err, label = error_label(err), "command failed");
    }
    outcome.with_context(|| format!("{} failed", command.name()))
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing_with_dotenv();

    let command = match Command::parse(std::env::args().skip(1)) {
        Ok(command) => command,
        Err(err) => {
            eprintln!("{err}\n\n{USAGE}");
            return ExitCode::from(2);
        }
    };

    if matches!(command, Command::Help) {
        println!("{USAGE}");
        return ExitCode::SUCCESS;
    }

    match run(command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
