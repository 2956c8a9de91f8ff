//! Catalog Downloader Library
//!
//! Crawls a paginated catalog site, finds every item's download page,
//! trades a time-keyed token for a one-time download link per item, and
//! streams each file to local storage.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`config`] - Run configuration, site layout, and pre-flight validation
//! - [`fetch`] - Shared HTTP client and HTML element lookup
//! - [`signer`] - Time-keyed link signing
//! - [`crawler`] - Category and paginated item enumeration
//! - [`download`] - Hidden-form scraping and append-mode streaming
//! - [`gate`] - Global bounded-concurrency limiter
//! - [`pipeline`] - Two-phase driver tying the stages together

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod crawler;
pub mod download;
pub mod error;
pub mod fetch;
pub mod gate;
pub mod pipeline;
pub mod signer;
mod user_agent;

// Re-export commonly used types
pub use config::{ConfigError, CrawlConfig, DEFAULT_CONCURRENCY, SiteLayout};
pub use crawler::{CatalogCrawler, CategoryListing};
pub use download::{DownloadForm, DownloadOrchestrator, DownloadOutcome};
pub use error::{CrawlError, Stage, TaskFailure};
pub use fetch::{HttpClient, ParsedPage};
pub use gate::{ConcurrencyGate, GatePermit};
pub use pipeline::{Pipeline, PipelineState, RunError, RunReport};
pub use signer::{LinkSigner, SigningToken};
