use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use dotenvy::dotenv;
use tracing::{debug, Level};
use tracing_subscriber::FmtSubscriber;

use ckan_fetch_cli::{run, Config, RunOutcome};
use ckan_fetch_core::{AppError, DownloadSummary};

/// Exit code for failures outside the `AppError` taxonomy.
const GENERIC_FAILURE: u8 = 1;

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment variables from .env file
    dotenv().ok();

    // Parse CLI arguments first, so --help works without logs
    let config = Config::parse();

    match try_main(&config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let (message, code) = match err.downcast_ref::<AppError>() {
                Some(app_err) => (app_err.user_message(), app_err.exit_code()),
                None => (format!("{:#}", err), GENERIC_FAILURE),
            };
            debug!(exit_code = code, "Run failed: {:#}", err);
            eprintln!("\n❌ {}\n", message);
            ExitCode::from(code)
        }
    }
}

async fn try_main(config: &Config) -> anyhow::Result<()> {
    // Setup logging (stderr to keep stdout clean for listings)
    let level = if config.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("setting default subscriber failed")?;

    debug!(?config, "CLI arguments parsed");

    match run(config).await? {
        RunOutcome::DryRun(paths) => print_dry_run(&paths),
        RunOutcome::Downloaded(summary) => print_summary(&summary, config),
    }

    Ok(())
}

fn print_dry_run(paths: &[std::path::PathBuf]) {
    if paths.is_empty() {
        println!("No resources matched.");
        return;
    }
    println!("Would download {} resources:", paths.len());
    for path in paths {
        println!("  {}", path.display());
    }
}

fn print_summary(summary: &DownloadSummary, config: &Config) {
    if summary.total() == 0 {
        println!("\nNo resources matched for dataset \"{}\".\n", config.dataset_id);
        return;
    }

    println!(
        "\n✓ Downloaded {} resources ({}) into {}\n",
        summary.successful_count(),
        format_bytes(summary.total_bytes()),
        config.destination_dir.display()
    );
    for result in &summary.results {
        if let Some(path) = &result.path {
            println!("   {}", path.display());
        }
    }
    println!();
}

/// Human-readable byte count, e.g. `1.5 MB`.
fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}
