//! CLI command definitions
//!
//! Defines the clap commands for the api-e2e CLI.

use clap::{Args, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Run suites against an appliance
    Run(RunArgs),

    /// List registered suites with their case counts
    List {
        #[command(flatten)]
        sources: SuiteSources,
    },

    /// Load and validate suite files without contacting any host
    Check {
        /// Suite files to validate
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

/// Where suites are registered from
///
/// With no files, no directory and no --builtin, the bundled suites and the
/// user suites directory are registered.
#[derive(Args, Debug, Default, Clone)]
pub struct SuiteSources {
    /// Suite files (yaml, json or toml)
    pub files: Vec<PathBuf>,

    /// Register every suite file in a directory
    #[arg(long)]
    pub dir: Option<PathBuf>,

    /// Register the bundled suites
    #[arg(long)]
    pub builtin: bool,

    /// Only use suites whose name contains this text
    #[arg(long, short)]
    pub filter: Option<String>,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub sources: SuiteSources,

    /// Appliance host name or address
    #[arg(long, short = 'H')]
    pub host: Option<String>,

    /// Appliance port
    #[arg(long, short)]
    pub port: Option<u16>,

    /// URL scheme: http or https
    #[arg(long)]
    pub scheme: Option<String>,

    /// Skip TLS certificate verification
    #[arg(long, conflicts_with = "verify_tls")]
    pub insecure: bool,

    /// Verify the appliance's TLS certificate
    #[arg(long)]
    pub verify_tls: bool,

    /// Authentication method: local, jwt or token
    #[arg(long)]
    pub auth: Option<String>,

    /// Username (client id for token auth)
    #[arg(long, short)]
    pub username: Option<String>,

    /// Password (client token for token auth); defaults to $API_E2E_PASSWORD
    #[arg(long)]
    pub password: Option<String>,

    /// Global per-request timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Do not open the connection before the first timed request
    #[arg(long)]
    pub no_warm_up: bool,

    /// Run suites concurrently, one session each. Only safe when the suites
    /// touch disjoint resources.
    #[arg(long)]
    pub parallel: bool,

    /// Report format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}
