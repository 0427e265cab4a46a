//! assetrev - content-addressed asset manifest generator.
//!
//! Usage:
//!   assetrev                                  Run /etc/assetrev/config.json
//!   assetrev --config runs.json               Run another configuration list
//!   assetrev --channels_buf_size 64           Larger channel buffers
//!   assetrev --help                           Show help

use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use color_eyre::eyre::{Context, Result, bail};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use assetrev::{ScanOptions, load_run_configs, run_all};
use assetrev_core::DEFAULT_CHANNEL_CAPACITY;

const DEFAULT_CONFIG_PATH: &str = "/etc/assetrev/config.json";

#[derive(Parser)]
#[command(
    name = "assetrev",
    version,
    about = "Fingerprint asset files and write a revision manifest",
    long_about = "assetrev scans each configured root directory, computes a CRC-32 \
                  fingerprint for every file matching the filter, and writes a JSON \
                  manifest mapping source paths to fingerprinted destination paths."
)]
struct Cli {
    /// JSON file holding the list of run configurations
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Capacity of the record, completion and warning channels
    #[arg(long = "channels_buf_size", default_value_t = DEFAULT_CHANNEL_CAPACITY)]
    channels_buf_size: usize,

    /// Number of directory workers (0 = one per CPU)
    #[arg(short, long, default_value = "0")]
    workers: usize,

    /// Log per-run details
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    setup_logging(cli.verbose);

    if cli.channels_buf_size == 0 {
        bail!("--channels_buf_size must be at least 1");
    }

    info!(config = %cli.config.display(), "Loading run configurations");
    let configs = load_run_configs(&cli.config).context("Invalid configuration")?;

    let options = ScanOptions::new()
        .with_channel_capacity(cli.channels_buf_size)
        .with_workers(cli.workers);

    let start = Instant::now();
    let results = run_all(&configs, &options).await;

    let mut failed = 0;
    for (config, result) in configs.iter().zip(&results) {
        match result {
            Ok(report) if report.has_warnings() => info!(
                root = %report.root.display(),
                skipped = report.warnings.len(),
                "Completed with skipped entries"
            ),
            Ok(_) => {}
            Err(e) => {
                failed += 1;
                error!(root = %config.root_dir.display(), error = %e, "Run failed");
            }
        }
    }

    info!(
        runs = results.len(),
        failed,
        elapsed = ?start.elapsed(),
        "All done"
    );

    Ok(())
}

fn setup_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("assetrev=debug,assetrev_scan=debug,assetrev_manifest=debug,warn")
        } else {
            EnvFilter::new("assetrev=info,assetrev_manifest=info,warn")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}
