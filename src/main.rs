use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;

use cli::achievements::ProgressChange;

#[derive(Parser)]
#[command(name = "edvantage")]
#[command(about = "Edvantage achievements - progress, badges, points and levels")]
#[command(version)]
struct Cli {
    /// User whose achievements to operate on
    #[arg(short, long, global = true, default_value = "local")]
    user: String,

    /// Path to the config file (defaults to ~/.edvantage/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config file with the built-in catalog
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },

    /// List the achievement catalog
    Catalog {
        /// Only show this category (e.g. task-master, streak)
        #[arg(long)]
        category: Option<String>,
    },

    /// Set progress towards an achievement
    Progress {
        achievement: String,
        value: f64,
    },

    /// Add one unit of progress towards an achievement
    Increment { achievement: String },

    /// Earn an achievement outright
    Award { achievement: String },

    /// Show level, points and progress
    Status {
        /// Only show this category
        #[arg(long)]
        category: Option<String>,
    },

    /// Create a shareable snapshot of earned achievements
    Share {
        /// Name shown on the shared page
        #[arg(long)]
        name: String,
    },

    /// Show a shared snapshot
    Resolve {
        snapshot: String,

        /// Print raw JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = cli.config.as_ref();
    let user = cli.user.as_str();

    match cli.command {
        Commands::Init { force } => {
            cli::init::init_command(config, force).await?;
        }
        Commands::Catalog { category } => {
            cli::status::catalog_command(config, category).await?;
        }
        Commands::Progress { achievement, value } => {
            cli::achievements::progress_command(config, user, &achievement, ProgressChange::Set(value))
                .await?;
        }
        Commands::Increment { achievement } => {
            cli::achievements::progress_command(config, user, &achievement, ProgressChange::Increment)
                .await?;
        }
        Commands::Award { achievement } => {
            cli::achievements::award_command(config, user, &achievement).await?;
        }
        Commands::Status { category } => {
            cli::status::status_command(config, user, category).await?;
        }
        Commands::Share { name } => {
            cli::share::share_command(config, user, &name).await?;
        }
        Commands::Resolve { snapshot, json } => {
            cli::share::resolve_command(config, &snapshot, json).await?;
        }
    }

    Ok(())
}
