//! CLI command handling
//!
//! Builds the registry and configuration from the command line, runs suites
//! and maps the outcome to a process exit code.

use std::path::{Path, PathBuf};

use colored::Colorize;
use futures_util::future::join_all;

use crate::commands::{Commands, OutputFormat, RunArgs, SuiteSources};
use crate::common::config::{Config, Overrides};
use crate::common::{paths, Error, Result};
use crate::executor::RequestExecutor;
use crate::report::{self, ConsoleReporter, JsonReporter, Reporter, RunSummary, Silent};
use crate::runner::{Cancellation, SuiteResult, SuiteRunner};
use crate::suite::{self, Phase, SuiteRegistry};

/// Exit code for configuration and suite-loading errors
pub const EXIT_ENGINE_ERROR: i32 = 2;

/// Dispatch a CLI command, returning the process exit code
///
/// `verbose` also shows the request and body of failing cases.
pub async fn dispatch(command: Commands, config_path: Option<&Path>, verbose: bool) -> Result<i32> {
    match command {
        Commands::Run(args) => {
            let mut config = Config::load(config_path)?;
            let registry = build_registry(&args.sources, config.run.suites_dir.as_deref())?;
            config.apply_overrides(overrides(&args)?);
            run(&registry, &args, &config, verbose).await
        }

        Commands::List { sources } => {
            let config = Config::load(config_path)?;
            let registry = build_registry(&sources, config.run.suites_dir.as_deref())?;
            for suite in registry.select(sources.filter.as_deref())? {
                let counts: Vec<String> = Phase::ORDER
                    .iter()
                    .map(|p| format!("{}={}", p, suite.cases(*p).len()))
                    .collect();
                println!(
                    "{:<28} {:<40} {}",
                    suite.name.bold(),
                    suite.primary_uri,
                    counts.join(" ").dimmed()
                );
            }
            Ok(0)
        }

        Commands::Check { files } => {
            let mut failures = 0;
            for path in &files {
                match suite::load_file(path) {
                    Ok(s) => println!(
                        "  {} {} ({} cases)",
                        "✓".green(),
                        path.display(),
                        s.total_cases()
                    ),
                    Err(e) => {
                        failures += 1;
                        println!("  {} {}: {}", "✗".red(), path.display(), e);
                    }
                }
            }
            Ok(if failures == 0 { 0 } else { EXIT_ENGINE_ERROR })
        }
    }
}

/// Register suites from the given sources
///
/// Explicit files, `--dir` and `--builtin` are combined. When none are given
/// the bundled suites plus the user and configured suite directories are used.
pub fn build_registry(sources: &SuiteSources, config_dir: Option<&Path>) -> Result<SuiteRegistry> {
    let mut registry = SuiteRegistry::new();
    let explicit = !sources.files.is_empty() || sources.dir.is_some() || sources.builtin;

    if sources.builtin || !explicit {
        registry.register_builtin()?;
    }
    if !explicit {
        let dirs: Vec<PathBuf> = paths::suites_dir()
            .into_iter()
            .chain(config_dir.map(Path::to_path_buf))
            .filter(|d| d.is_dir())
            .collect();
        for dir in dirs {
            let count = registry.load_dir(&dir)?;
            tracing::debug!(dir = %dir.display(), count, "Loaded suite directory");
        }
    }
    if let Some(dir) = &sources.dir {
        registry.load_dir(dir)?;
    }
    for file in &sources.files {
        registry.load_file(file)?;
    }

    if registry.is_empty() {
        return Err(Error::Config("No suites registered".to_string()));
    }
    Ok(registry)
}

fn overrides(args: &RunArgs) -> Result<Overrides> {
    Ok(Overrides {
        host: args.host.clone(),
        port: args.port,
        scheme: args.scheme.as_deref().map(str::parse).transpose()?,
        insecure: args.insecure,
        verify_tls: args.verify_tls,
        auth: args.auth.as_deref().map(str::parse).transpose()?,
        username: args.username.clone(),
        password: args.password.clone(),
        timeout_secs: args.timeout,
        no_warm_up: args.no_warm_up,
    })
}

async fn run(
    registry: &SuiteRegistry,
    args: &RunArgs,
    config: &Config,
    verbose: bool,
) -> Result<i32> {
    let suites = registry.select(args.sources.filter.as_deref())?;
    let credentials = config.credentials()?;
    let target = config.target();
    let policy = config.transport_policy();

    let cancel = Cancellation::new();
    cancel.cancel_on_ctrl_c();

    let mut reporter: Box<dyn Reporter> = match args.format {
        OutputFormat::Text => Box::new(ConsoleReporter::stdout(verbose)),
        OutputFormat::Json => Box::new(JsonReporter::stdout()),
    };

    tracing::info!(appliance = %target, suites = suites.len(), parallel = args.parallel, "Starting run");

    let new_executor = || {
        RequestExecutor::new(target.clone(), credentials.clone(), policy.clone())
            .warm_up(config.run.warm_up)
    };

    let results: Vec<SuiteResult> = if args.parallel {
        let runs = suites.iter().map(|suite| {
            let cancel = cancel.clone();
            let executor = new_executor();
            async move {
                SuiteRunner::new(suite, executor)
                    .with_cancellation(cancel)
                    .run(&mut Silent)
                    .await
            }
        });
        let results = join_all(runs).await;
        for (suite, result) in suites.iter().zip(&results) {
            report::replay(reporter.as_mut(), suite, result);
        }
        results
    } else {
        let mut results = Vec::with_capacity(suites.len());
        for suite in &suites {
            let result = SuiteRunner::new(suite, new_executor())
                .with_cancellation(cancel.clone())
                .run(reporter.as_mut())
                .await;
            results.push(result);
        }
        results
    };

    let summary = RunSummary::from_results(&results);
    reporter.finish(&summary);
    Ok(summary.exit_code())
}
