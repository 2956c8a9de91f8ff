//! CLI entry point for the catalog downloader.

use anyhow::{Context, Result, bail};
use catalog_downloader::{CrawlConfig, Pipeline};
use clap::Parser;
use tracing::{debug, info, warn};

mod cli;

use cli::Args;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

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

    let config = CrawlConfig::new(args.root_url.as_deref())
        .and_then(|c| c.with_concurrency(usize::from(args.concurrency)))
        .and_then(|c| c.with_timeouts(args.connect_timeout, args.read_timeout))
        .context("configuration error")?
        .with_output_dir(&args.output_dir)
        .with_accept_invalid_certs(args.insecure);

    info!(root = %config.root_url(), "catalog downloader starting");

    let mut pipeline = Pipeline::new(&config)?;

    // Ctrl-C stops new tasks from starting; in-flight ones run to completion.
    let gate = pipeline.gate();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, finishing in-flight tasks");
            gate.close();
        }
    });

    let report = pipeline.run().await?;

    for failure in &report.failures {
        warn!(%failure, "task failed");
    }

    info!(
        categories = report.categories,
        items = report.items,
        completed = report.completed,
        failed_downloads = report.failed_downloads(),
        bytes = report.bytes,
        "Download complete"
    );

    if report.interrupted {
        bail!("interrupted; run again to continue");
    }

    Ok(())
}
