// SPDX-License-Identifier: Apache-2.0
use clap::Parser;
use ctm_log_list::{fetcher::Fetcher, LogEndpoint};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Synchronizes data from one or more CT logs and extracts hostnames.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Only read from the specified CT log base URL, instead of every
    /// built-in log.
    #[arg(long = "log-url")]
    log_url: Option<String>,

    /// Path to the SQLite database file.
    #[arg(long, default_value = "ctm.db")]
    db_path: PathBuf,

    /// Verify TLS certificates presented by log operators. Off by default
    /// because several public logs run with misconfigured chains.
    #[arg(long)]
    verify_tls: bool,

    /// Accepted for interface compatibility with the reference tool;
    /// CPU profiling isn't implemented here.
    #[arg(long)]
    cpuprofile: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Certificate subject strings are compared byte-for-byte; a locale-aware
    // collation would silently change dedup behavior.
    std::env::set_var("LC_ALL", "C");
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    tracing::info!("starting");
    if let Some(path) = &args.cpuprofile {
        tracing::warn!(
            path = %path.display(),
            "--cpuprofile requested but profiling is not implemented, ignoring"
        );
    }

    let pool = ctm_db::connect(&args.db_path).await?;
    let logs = ctm_log_list::configured_logs();
    let only = args.log_url.map(LogEndpoint::new);

    let fetcher = Fetcher::new(args.verify_tls);
    let config = ctm_pipeline::Config {
        verify_tls: args.verify_tls,
        ..Default::default()
    };

    let metrics = ctm_pipeline::run(&pool, fetcher, config, &logs, only.as_ref()).await;
    let (input, output) = metrics.snapshot();
    tracing::info!(certs_extracted = input, rows_inserted = output, "finished");

    Ok(())
}
