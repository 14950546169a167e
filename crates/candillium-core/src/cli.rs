use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::anyhow;
use clap::{ArgAction, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
pub struct KeyVal {
    pub key: String,
    pub value: String,
}

impl std::str::FromStr for KeyVal {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (k, v) = s
            .split_once('=')
            .ok_or_else(|| anyhow!("expected KEY=VALUE, got: {s}"))?;
        Ok(Self {
            key: k.trim().to_string(),
            value: v.trim().to_string(),
        })
    }
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "candillium",
    version,
    about = "Candillium: recruiter dashboard and todo list over a managed backend",
    disable_help_subcommand = true
)]
pub struct GlobalCli {
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[arg(short = 'q', long = "quiet", action = ArgAction::Count, global = true)]
    pub quiet: u8,

    #[arg(
        long = "set",
        value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<KeyVal>()),
        action = ArgAction::Append,
        global = true
    )]
    pub overrides: Vec<KeyVal>,

    #[arg(long = "config", global = true)]
    pub config: Option<PathBuf>,

    #[arg(long = "data", global = true)]
    pub data: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Start a session for LOGIN_ID.
    Login { login_id: String },
    /// End the current session.
    Logout,
    /// Show the signed-in identity.
    Whoami,
    /// Root page: the dashboard when signed in.
    Home,
    Dashboard(DashboardArgs),
    #[command(subcommand)]
    Todos(TodosCommand),
    #[command(subcommand)]
    Candidates(CandidatesCommand),
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct DashboardArgs {
    /// Case-insensitive name filter.
    #[arg(long)]
    pub search: Option<String>,

    #[arg(long = "newest-first")]
    pub newest_first: bool,

    /// 1-based row of the displayed list to open in the detail pane.
    #[arg(long)]
    pub select: Option<usize>,

    /// Render with the user menu open.
    #[arg(long)]
    pub menu: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum TodosCommand {
    List,
    Add {
        /// Content to create with; prompts when absent.
        #[arg(long)]
        content: Option<String>,
    },
    Delete { id: String },
    /// Interactive list that follows live updates.
    Shell,
}

#[derive(Subcommand, Debug, Clone)]
pub enum CandidatesCommand {
    /// Load candidates from a JSON array file into the store.
    Import { file: PathBuf },
}

pub fn init_tracing(verbose: u8, quiet: u8) -> anyhow::Result<()> {
    let default_level = if quiet >= 2 {
        "error"
    } else if quiet == 1 {
        "warn"
    } else if verbose >= 3 {
        "trace"
    } else if verbose == 2 {
        "debug"
    } else if verbose == 1 {
        "info"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    let init_result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }

    Ok(())
}
