//! Error types shared by the crawl, signing, and download stages.
//!
//! Every variant carries the URL or path it failed on so that contained
//! per-task failures can be reported with enough context to diagnose.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by a single crawl or download task.
#[derive(Debug, Error)]
pub enum CrawlError {
    /// Network-level error (DNS resolution, connection refused, TLS errors, body read).
    #[error("network error fetching {url}: {source}")]
    Network {
        /// The URL that failed.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before completion.
    #[error("timeout fetching {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// Non-success HTTP response.
    #[error("HTTP {status} fetching {url}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// A URL could not be parsed or resolved.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The offending URL or href.
        url: String,
    },

    /// An element the task depends on is missing from a fetched page.
    #[error("parse error on {url}: {reason}")]
    Parse {
        /// The page that was being parsed.
        url: String,
        /// What was missing or malformed.
        reason: String,
    },

    /// The signing endpoint answered with something other than a usable link.
    #[error("signing failed via {url}: {reason}")]
    Signing {
        /// The signing endpoint URL that was queried.
        url: String,
        /// Why the response was rejected.
        reason: String,
    },

    /// File system error while writing a download.
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl CrawlError {
    /// Creates a network error, promoting reqwest timeouts to [`CrawlError::Timeout`].
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        let url = url.into();
        if source.is_timeout() {
            Self::Timeout { url }
        } else {
            Self::Network { url, source }
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates a parse error.
    pub fn parse(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Parse {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Creates a signing error.
    pub fn signing(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Signing {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

// No From<reqwest::Error> / From<std::io::Error>: every variant needs the
// url or path, which the source errors don't carry.

/// Pipeline stage a contained failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Pagination count discovery on a category's first page.
    CategoryPage,
    /// Item enumeration on one page of a category.
    ListingPage,
    /// Fetching or parsing an item's download sub-page.
    DownloadPage,
    /// Exchanging a time key for a signed link.
    Signing,
    /// Posting the form and streaming the body to disk.
    Transfer,
    /// The task itself panicked or was aborted.
    Task,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::CategoryPage => "category-page",
            Self::ListingPage => "listing-page",
            Self::DownloadPage => "download-page",
            Self::Signing => "signing",
            Self::Transfer => "transfer",
            Self::Task => "task",
        };
        f.write_str(label)
    }
}

/// A failure contained to one category, page, or item.
#[derive(Debug)]
pub struct TaskFailure {
    /// Where in the pipeline it failed.
    pub stage: Stage,
    /// The category, page, or item URL the task was working on.
    pub url: String,
    /// The underlying error, or `None` when the task panicked.
    pub error: Option<CrawlError>,
}

impl TaskFailure {
    /// Records a failed task.
    pub fn new(stage: Stage, url: impl Into<String>, error: CrawlError) -> Self {
        Self {
            stage,
            url: url.into(),
            error: Some(error),
        }
    }

    /// Records a task that never returned (panic or abort).
    pub fn aborted(url: impl Into<String>) -> Self {
        Self {
            stage: Stage::Task,
            url: url.into(),
            error: None,
        }
    }
}

impl fmt::Display for TaskFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.error {
            Some(error) => write!(f, "[{}] {}: {error}", self.stage, self.url),
            None => write!(f, "[{}] {}: task aborted", self.stage, self.url),
        }
    }
}

impl std::error::Error for TaskFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.error
            .as_ref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}
