//! # Compound Finder CLI (`cfind`)
//!
//! Builds the compound catalog from the configured spreadsheets and either
//! serves it over HTTP or answers a single lookup.
//!
//! ## Usage
//!
//! ```bash
//! cfind --config ./config/cfind.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `cfind serve` | Build the catalog and start the HTTP server |
//! | `cfind search "<query>"` | Look up a compound (or `--type category`) |
//! | `cfind sources` | List configured workbooks and their health |
//! | `cfind stats` | Build the catalog and print counts |
//!
//! Logging goes to stderr and is controlled with `RUST_LOG`
//! (default `info`).

use clap::{Parser, Subcommand};
use compound_finder::{config, search, server, sources, stats};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Compound Finder: look up which spreadsheet files list a compound or
/// any compound of a category.
#[derive(Parser)]
#[command(
    name = "cfind",
    about = "Compound Finder: look up compounds and categories across spreadsheet files",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/cfind.toml`; when that file is absent an empty
    /// configuration is used. Workbook locations, sheet and column choices,
    /// and the server bind address are read from it.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Build the catalog and start the HTTP server.
    ///
    /// Binds to `[server].bind` (the `PORT` environment variable overrides
    /// the port) once the catalog is fully built.
    Serve,

    /// Look up files for a compound formula or a category.
    Search {
        /// Compound formula or category name. Case and spacing are ignored.
        query: String,

        /// Query kind: `compound` or `category`.
        #[arg(long = "type", default_value = "compound")]
        kind: String,

        /// Print the JSON body the HTTP API would return.
        #[arg(long)]
        json: bool,
    },

    /// List configured workbooks and whether they can be read.
    Sources,

    /// Build the catalog and print index counts.
    Stats,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let cfg = config::load_cli_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
        Commands::Search { query, kind, json } => {
            search::run_search(&cfg, &query, &kind, json)?;
        }
        Commands::Sources => {
            sources::list_sources(&cfg)?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg)?;
        }
    }

    Ok(())
}
