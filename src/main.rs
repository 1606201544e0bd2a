//! resync CLI entrypoint.
//!
//! This is the main entrypoint for the resync command-line tool.

use std::process::ExitCode;
use std::sync::Arc;

use resync::cli::{Cli, OutputFormat, OutputFormatter};
use resync::error::Result;
use resync::orchestrator::Orchestrator;
use resync::progress::{ConsoleProgress, NullProgress, ProgressReporter};
use resync::sync::SyncContext;
use resync::ApiClient;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Main entrypoint.
fn main() -> ExitCode {
    // Load .env before parsing so clap's env fallbacks can see it.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose);

    // Run async runtime
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    // Isolated item-level failures are reported inside the run and do not
    // affect the exit code; only fatal (pre-apply) errors do.
    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Initializes the logging system.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Main async entry point.
async fn run(cli: Cli) -> Result<()> {
    let formatter = OutputFormatter::new(cli.output);

    let source = Arc::new(ApiClient::new(&cli.source_url, &cli.source_token)?);
    let target = Arc::new(ApiClient::new(&cli.target_url, &cli.target_token)?);

    info!(
        "Synchronizing {} -> {}",
        source.endpoint(),
        target.endpoint()
    );

    let ctx = SyncContext::new(source, target, cli.include_environment);

    // Progress bars only make sense for an interactive text-mode apply.
    let console = ConsoleProgress::new();
    let quiet = NullProgress;
    let progress: &dyn ProgressReporter = match cli.output {
        OutputFormat::Text if !cli.dry_run => &console,
        _ => &quiet,
    };

    let orchestrator = Orchestrator::new(ctx, cli.module_selection())
        .with_dry_run(cli.dry_run)
        .with_progress(progress);

    let report = orchestrator.run().await?;

    eprintln!("{}", formatter.format_report(&report));

    Ok(())
}
