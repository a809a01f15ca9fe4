//! CLI entry point for the sci-clone tool.

use anyhow::Result;
use clap::Parser;
use tracing::debug;

use sci_clone::commands::{RunOptions, run_doi_command, run_issn_command};

mod cli;

use cli::{Args, Command};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Determine log level based on verbose/quiet flags
    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    debug!(?args, "CLI arguments parsed");

    let options = RunOptions {
        dir: args.dir,
        mirror_host: args.scihub,
        protocol: args.protocol,
        max_retries: args.max_retries,
        show_progress: !args.quiet,
    };

    match args.command {
        Command::Issn {
            issn,
            year_from,
            year_to,
        } => run_issn_command(&options, &issn, year_from, year_to).await,
        Command::Doi { ids } => run_doi_command(&options, &ids).await,
    }
}
