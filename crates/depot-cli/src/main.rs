//! # depot CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use depot_cli::client::Client;
use depot_cli::{delete, list, pull, push, DEFAULT_SERVER};

/// Client for the depot artifact registry.
#[derive(Parser, Debug)]
#[command(name = "depot", version, about)]
struct Cli {
    /// Registry server URL.
    #[arg(long, global = true, default_value = DEFAULT_SERVER)]
    server: String,

    /// Authentication token.
    #[arg(long, global = true)]
    token: Option<String>,

    /// Enable verbose output. Repeat for more verbosity (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Upload an artifact version from a file.
    Push {
        package: String,
        version: String,
        file: PathBuf,
    },

    /// Download an artifact version.
    Pull {
        package: String,
        version: String,
        /// Output file path (default: <package>-<version>).
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// List all packages.
    List,

    /// Search packages by name substring.
    Search { query: String },

    /// Delete an artifact version.
    Delete { package: String, version: String },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        _ => EnvFilter::new("debug"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    tracing::debug!(server = %cli.server, "depot CLI starting");

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(1)
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let Some(token) = cli.token.as_deref().filter(|t| !t.is_empty()) else {
        bail!("--token is required");
    };
    let client = Client::new(&cli.server, token)?;

    match &cli.command {
        Commands::Push {
            package,
            version,
            file,
        } => push::run_push(&client, package, version, file).await,
        Commands::Pull {
            package,
            version,
            output,
        } => pull::run_pull(&client, package, version, output.clone()).await,
        Commands::List => list::run_list(&client).await,
        Commands::Search { query } => list::run_search(&client, query).await,
        Commands::Delete { package, version } => {
            delete::run_delete(&client, package, version).await
        }
    }
}
