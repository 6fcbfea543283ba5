mod cli_args;
mod commands;
mod render;

use std::{io, process::ExitCode};

use anyhow::Result;
use clap::Parser;
use jiratools_config::ToolsConfig;
use jiratools_domain::ReportError;
use jiratools_jira::JiraClient;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::{
    cli_args::{Cli, Command},
    commands::{mine_command, release_notes_command, servicedesk_command, unblocked_command},
};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            error!("run aborted: {error:#}");
            ExitCode::from(exit_code_for(&error))
        }
    }
}

/// Logs go to stderr so report text on stdout stays clean.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .compact()
                .with_target(false)
                .with_writer(io::stderr),
        )
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let config = ToolsConfig::load(cli.config.as_deref())?;
    let client = JiraClient::from_config(&config)?;
    let mut out = io::stdout().lock();

    match &cli.command {
        Command::ReleaseNotes(args) => release_notes_command(&client, &config, args, &mut out),
        Command::Unblocked(args) => unblocked_command(&client, &config, args, &mut out),
        Command::Servicedesk(args) => servicedesk_command(&client, &config, args, &mut out),
        Command::Mine(args) => mine_command(&client, &config, args, &mut out),
    }
}

/// 1 for a failed report, 2 for configuration and I/O problems.
fn exit_code_for(error: &anyhow::Error) -> u8 {
    if error.downcast_ref::<ReportError>().is_some() {
        1
    } else {
        2
    }
}
