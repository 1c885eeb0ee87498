mod api;
mod cli;
mod config;
mod db;
mod models;
mod services;
mod utils;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use config::Settings;

#[derive(Parser)]
#[command(name = "nbascrape")]
#[command(about = "Scrape NBA team schedules or look them up")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Serve {
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Scrape team schedule pages into the database
    Scrape {
        /// Team page path, e.g. /gsw/golden-state-warriors (repeatable)
        #[arg(short, long = "path", required_unless_present = "file")]
        paths: Vec<String>,
        /// Read a saved schedule page instead of fetching
        #[arg(short, long, requires = "name", conflicts_with = "paths")]
        file: Option<PathBuf>,
        /// Team name for --file
        #[arg(short, long)]
        name: Option<String>,
    },
    /// Manage or inspect the database
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Show a team's schedule
    Team {
        #[arg(short, long)]
        name: String,
    },
}

#[derive(Subcommand)]
enum DbCommands {
    /// Create the tables
    Migrate,
    /// List teams and their games
    List,
    /// Export all games as CSV
    Export {
        #[arg(short, long, default_value = "games.csv")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load environment variables
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    let settings = Settings::from_env()?;

    match cli.command {
        Some(Commands::Serve { port }) => {
            let port = port.unwrap_or(settings.port);
            tracing::info!("Starting nbascrape API server on port {}", port);
            api::serve(&settings, port).await?;
        }
        Some(Commands::Scrape { paths, file, name }) => match (file, name) {
            (Some(file), Some(name)) => {
                tracing::info!("Ingesting {} for {}", file.display(), name);
                cli::scrape_file(&settings, &file, &name).await?;
            }
            _ => {
                tracing::info!("Scraping {} team page(s)", paths.len());
                cli::scrape_teams(&settings, &paths).await?;
            }
        },
        Some(Commands::Db { command }) => match command {
            DbCommands::Migrate => {
                tracing::info!("Initializing database...");
                db::init_database(&settings.database_url).await?;
            }
            DbCommands::List => cli::list(&settings).await?,
            DbCommands::Export { out } => cli::export_csv(&settings, &out).await?,
        },
        Some(Commands::Team { name }) => {
            tracing::info!("Querying team: {}", name);
            cli::query_team(&settings, &name).await?;
        }
        None => {
            // Default to serving
            tracing::info!("Starting nbascrape API server on port {}", settings.port);
            api::serve(&settings, settings.port).await?;
        }
    }

    Ok(())
}
