//! folio CLI.
//!
//! Provides commands for:
//! - `tree`: Print the page tree of the local content directory
//! - `records`: Print the search records of the local content
//! - `sync`: Replace a JSON search index with those records
//! - `diff`: Compare a cache file with the local content
//! - `serve`: Run the GitHub webhook service

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{ContentArgs, DiffArgs, RecordsArgs, ServeArgs, SyncArgs, TreeArgs};
use output::Output;

/// folio - content engine for documentation sites.
#[derive(Parser)]
#[command(name = "folio", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the page tree as JSON.
    Tree(TreeArgs),
    /// Print search index records as JSON.
    Records(RecordsArgs),
    /// Write search records to a JSON index.
    Sync(SyncArgs),
    /// Compare a cache file with the content directory.
    Diff(DiffArgs),
    /// Start the webhook server.
    Serve(ServeArgs),
}

impl Commands {
    fn content(&self) -> &ContentArgs {
        match self {
            Self::Tree(args) => &args.content,
            Self::Records(args) => &args.content,
            Self::Sync(args) => &args.content,
            Self::Diff(args) => &args.content,
            Self::Serve(args) => &args.content,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if cli.command.content().verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Tree(args) => args.execute(),
        Commands::Records(args) => args.execute(),
        Commands::Sync(args) => args.execute(),
        Commands::Diff(args) => args.execute(),
        Commands::Serve(args) => args.execute(),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
