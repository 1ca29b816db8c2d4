use anyhow::Result;
use clap::{Parser, Subcommand};
use periscope::client::DEFAULT_HOOK_LIMIT;
use periscope::config::Config;
use periscope::hook::PhaseFilter;
use std::path::PathBuf;

mod cmd;

#[derive(Parser)]
#[command(name = "periscope")]
#[command(version, about = "Terminal viewer for deployment and issue-resolution runs")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// API base URL. Overrides periscope.toml and PERISCOPE_API_URL.
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Path to periscope.toml. Defaults to the user config directory.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Watch the deployment log of a task
    Deploy {
        task_id: String,
        /// Fetch and render once instead of watching
        #[arg(long)]
        once: bool,
        /// Restrict the log to one macro-phase
        #[arg(long, default_value = "all")]
        phase: PhaseFilter,
        /// Give every status/query event its own step
        #[arg(long)]
        isolate: bool,
        /// Hooks fetched per poll
        #[arg(long, default_value_t = DEFAULT_HOOK_LIMIT)]
        limit: u32,
    },
    /// Watch an issue resolution: stage progress plus the live step log
    Issue {
        project_id: String,
        issue_id: String,
        /// Fetch and render once instead of watching
        #[arg(long)]
        once: bool,
        /// Hooks fetched per poll
        #[arg(long, default_value_t = DEFAULT_HOOK_LIMIT)]
        limit: u32,
    },
    /// Show the stage status of an issue resolution
    Stages {
        project_id: String,
        issue_id: String,
        /// Ask the backend to retry the current stage first
        #[arg(long)]
        retry: bool,
    },
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "periscope=debug" } else { "periscope=warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = Config::load(cli.config.as_deref(), cli.api_url.clone())?;

    match &cli.command {
        Commands::Deploy {
            task_id,
            once,
            phase,
            isolate,
            limit,
        } => {
            cmd::cmd_deploy(&config, task_id, *phase, *isolate, *once, *limit, cli.verbose).await
        }
        Commands::Issue {
            project_id,
            issue_id,
            once,
            limit,
        } => cmd::cmd_issue(&config, project_id, issue_id, *once, *limit, cli.verbose).await,
        Commands::Stages {
            project_id,
            issue_id,
            retry,
        } => cmd::cmd_stages(&config, project_id, issue_id, *retry).await,
    }
}
