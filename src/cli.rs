//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

use catalog_downloader::config::{
    CONNECT_TIMEOUT_SECS, DEFAULT_CONCURRENCY, DEFAULT_OUTPUT_DIR, READ_TIMEOUT_SECS,
};

/// Crawl a paginated catalog site and download every item it lists.
#[derive(Parser, Debug)]
#[command(name = "catalog-downloader")]
#[command(author, version, about)]
pub struct Args {
    /// Site origin, e.g. https://roms.example
    #[arg(value_name = "ROOT_URL")]
    pub root_url: Option<String>,

    /// Directory downloads are appended into
    #[arg(short, long, default_value = DEFAULT_OUTPUT_DIR)]
    pub output_dir: PathBuf,

    /// Maximum concurrent category walks and downloads (1-100)
    #[arg(short = 'c', long, default_value_t = DEFAULT_CONCURRENCY as u8, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub concurrency: u8,

    /// HTTP connect timeout in seconds (1-3600)
    #[arg(long, default_value_t = CONNECT_TIMEOUT_SECS, value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub connect_timeout: u64,

    /// Seconds without receiving data before a request is abandoned (1-3600)
    #[arg(long, default_value_t = READ_TIMEOUT_SECS, value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub read_timeout: u64,

    /// Accept invalid TLS certificates
    #[arg(long)]
    pub insecure: bool,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,
}
