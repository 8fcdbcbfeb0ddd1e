use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use namefix::remote::Remote;

mod cmd;

#[derive(Parser)]
#[command(name = "namefix")]
#[command(version, about = "Find poorly named identifiers with a code-analysis service and rename them")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Project root. Directive paths are resolved against it.
    #[arg(long, global = true)]
    pub project_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Index a repository, ask for rename suggestions and save them as a plan
    Suggest {
        /// Code host (github or gitlab)
        #[arg(long)]
        remote: Option<Remote>,

        /// Repository as <owner>/<repo-name>
        #[arg(long)]
        repo: Option<String>,

        #[arg(long)]
        branch: Option<String>,

        /// Apply the suggestions right away
        #[arg(long)]
        apply: bool,

        /// With --apply, report what would change without writing
        #[arg(long)]
        dry_run: bool,

        /// Fail instead of prompting for missing values
        #[arg(long)]
        no_input: bool,
    },
    /// Check the indexing status of a repository once
    Status {
        #[arg(long, default_value = "github")]
        remote: Remote,

        #[arg(long)]
        repo: String,

        #[arg(long, default_value = "main")]
        branch: String,
    },
    /// Apply a saved rename plan to the project
    Apply {
        /// Plan file (defaults to the configured plan_file)
        plan: Option<PathBuf>,

        #[arg(long)]
        dry_run: bool,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,

        /// Allow directive paths that leave the project directory
        #[arg(long)]
        allow_outside_root: bool,
    },
    /// Write a standalone Rust program that replays a saved plan
    Replay {
        /// Plan file (defaults to the configured plan_file)
        plan: Option<PathBuf>,

        /// Output file (defaults to the configured replay_file)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// View or validate configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    Show,
    Validate,
    Init,
}

fn init_tracing(verbose: bool) -> Result<()> {
    let default_level = if verbose { "namefix=debug" } else { "namefix=info" };
    let filter = match std::env::var("RUST_LOG") {
        Ok(_) => EnvFilter::from_default_env(),
        Err(_) => EnvFilter::new(default_level),
    };
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .with(filter)
        .try_init()
        .context("Failed to initialize logging")?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    let project_dir = match cli.project_dir.clone() {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };
    namefix::config::load_dotenv(&project_dir)?;

    match &cli.command {
        Commands::Suggest {
            remote,
            repo,
            branch,
            apply,
            dry_run,
            no_input,
        } => {
            let args = cmd::SuggestArgs {
                remote: *remote,
                repository: repo.clone(),
                branch: branch.clone(),
                apply: *apply,
                dry_run: *dry_run,
                interactive: !*no_input && console::user_attended(),
            };
            cmd::cmd_suggest(&project_dir, args).await?;
        }
        Commands::Status {
            remote,
            repo,
            branch,
        } => cmd::cmd_status(&project_dir, *remote, repo, branch).await?,
        Commands::Apply {
            plan,
            dry_run,
            json,
            allow_outside_root,
        } => cmd::cmd_apply(
            &project_dir,
            plan.as_deref(),
            *dry_run,
            *json,
            *allow_outside_root,
        )?,
        Commands::Replay { plan, output } => {
            cmd::cmd_replay(&project_dir, plan.as_deref(), output.as_deref())?
        }
        Commands::Config { command } => cmd::cmd_config(&project_dir, command.clone())?,
    }

    Ok(())
}
