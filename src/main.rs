//! api-e2e - declarative end-to-end tests for an appliance REST API
//!
//! Runs suites of create/read/update/delete cases against a live host and
//! reports a verdict per case.

use std::path::PathBuf;

use apie2e::cli::{self, EXIT_ENGINE_ERROR};
use apie2e::commands::Commands;
use apie2e::common::logging;
use clap::Parser;

#[derive(Parser)]
#[command(name = "api-e2e", about = "End-to-end tests for an appliance REST API")]
#[command(version, long_about = None)]
struct Cli {
    /// Config file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging, and request details for failing cases
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Also write logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let guard = logging::init_cli(cli.verbose, cli.log_file.as_deref());

    let code = match cli::dispatch(cli.command, cli.config.as_deref(), cli.verbose).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            EXIT_ENGINE_ERROR
        }
    };

    drop(guard);
    std::process::exit(code);
}
