use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "jiratools",
    version,
    about = "Sprint release notes, blocking-status audits and issue lists from Jira"
)]
pub struct Cli {
    /// Config file (defaults to $JIRATOOLS_CONFIG_FILE or ~/.config/jiratools/config.yaml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log debug diagnostics to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Release notes for the latest (or an older) sprint of each project
    #[command(name = "releasenotes")]
    ReleaseNotes(ReleaseNotesArgs),
    /// Open issues whose linked issues are resolved or newly in progress
    Unblocked(UnblockedArgs),
    /// Recent service desk issues as CSV
    Servicedesk(ServicedeskArgs),
    /// Unresolved issues assigned to the current user
    Mine(MineArgs),
}

#[derive(Debug, Args)]
pub struct ReleaseNotesArgs {
    /// Comma separated list of projects whose boards are evaluated
    #[arg(short = 'b', long = "boards", value_delimiter = ',', required = true)]
    pub projects: Vec<String>,

    /// Use the active sprint instead of the last closed one
    #[arg(short, long)]
    pub active: bool,

    /// How many sprints to step back from the most recent one
    #[arg(short, long, default_value_t = 0)]
    pub look_back: usize,

    /// One section per project instead of a combined report
    #[arg(short, long)]
    pub separate: bool,

    /// Markdown output instead of Confluence wiki markup
    #[arg(short, long)]
    pub markdown: bool,

    /// Label that marks issues for public release notes (overrides the config)
    #[arg(long)]
    pub release_label: Option<String>,

    /// Only list issues carrying this label
    #[arg(long, requires = "fix_version")]
    pub filter_label: Option<String>,

    /// Build release notes for a fix version instead of a sprint
    #[arg(long)]
    pub fix_version: Option<String>,
}

#[derive(Debug, Args)]
pub struct UnblockedArgs {
    /// Jira project to audit
    #[arg(short, long)]
    pub project: String,

    /// Worker threads used to check linked issues
    #[arg(long)]
    pub workers: Option<usize>,
}

#[derive(Debug, Args)]
pub struct ServicedeskArgs {
    /// Jira project to use
    #[arg(short, long)]
    pub project: String,

    /// Days of history to retrieve; 0 retrieves everything
    #[arg(short, long, default_value_t = 7)]
    pub days: i64,

    /// CSV file to write instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct MineArgs {
    /// Comma separated list of projects to include
    #[arg(short = 'i', long = "include-projects", value_delimiter = ',')]
    pub include: Vec<String>,

    /// Comma separated list of projects to exclude
    #[arg(
        short = 'x',
        long = "exclude-projects",
        value_delimiter = ',',
        conflicts_with = "include"
    )]
    pub exclude: Vec<String>,
}
