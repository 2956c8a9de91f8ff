//! Run configuration and its pre-flight validation.
//!
//! Nothing touches the network until [`CrawlConfig::new`] has accepted the
//! root origin and limits.

use std::path::PathBuf;
use std::time::Duration;

use tracing::debug;
use url::Url;

/// Minimum allowed concurrency value.
pub const MIN_CONCURRENCY: usize = 1;

/// Maximum allowed concurrency value.
pub const MAX_CONCURRENCY: usize = 100;

/// Default gate capacity, shared by crawling and downloading.
pub const DEFAULT_CONCURRENCY: usize = 3;

/// Default destination directory for downloads.
pub const DEFAULT_OUTPUT_DIR: &str = "roms";

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default HTTP read-idle timeout (5 minutes between body chunks).
pub const READ_TIMEOUT_SECS: u64 = 300;

const MAX_TIMEOUT_SECS: u64 = 3600;

/// Errors that make a run impossible before it starts.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// No root origin was supplied.
    #[error("root URL is not set")]
    MissingRootUrl,

    /// The root is not a bare http(s) origin (scheme and host, no path).
    #[error("invalid root URL {value:?}: {reason}")]
    InvalidRootUrl {
        /// The rejected value.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Invalid concurrency value provided.
    #[error(
        "invalid concurrency value {value}: must be between {MIN_CONCURRENCY} and {MAX_CONCURRENCY}"
    )]
    InvalidConcurrency {
        /// The invalid value that was provided.
        value: usize,
    },

    /// A timeout outside `1..=3600` seconds.
    #[error("invalid {field} {value}s: must be between 1 and {MAX_TIMEOUT_SECS}")]
    InvalidTimeout {
        /// Which timeout.
        field: &'static str,
        /// The rejected value in seconds.
        value: u64,
    },
}

/// Site-specific URL and markup conventions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteLayout {
    /// Path of the root listing that enumerates categories.
    pub catalog_path: String,
    /// Path of the endpoint that trades a time key for a download link.
    pub signing_path: String,
    /// Class marking category and item anchors.
    pub item_anchor_class: String,
    /// Class marking pagination anchors.
    pub pagination_class: String,
    /// Text of the pagination anchor pointing at the last page.
    pub last_page_text: String,
    /// Prefix inserted before the category segment of a download sub-page.
    pub download_prefix: String,
    /// Query parameter carrying the page index.
    pub page_param: String,
}

impl Default for SiteLayout {
    fn default() -> Self {
        Self {
            catalog_path: "/en/all-roms/list/consoles".to_string(),
            signing_path: "/en/emulators-roms/download/1/1".to_string(),
            item_anchor_class: "title-5".to_string(),
            pagination_class: "alphabetP".to_string(),
            last_page_text: ">>".to_string(),
            download_prefix: "download-".to_string(),
            page_param: "page".to_string(),
        }
    }
}

/// Validated configuration for one run.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    root_url: Url,
    output_dir: PathBuf,
    concurrency: usize,
    layout: SiteLayout,
    connect_timeout: Duration,
    read_timeout: Duration,
    accept_invalid_certs: bool,
}

impl CrawlConfig {
    /// Validates the root origin and builds a config with default limits.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingRootUrl`] for an absent or blank value and
    /// [`ConfigError::InvalidRootUrl`] when it is not a bare http(s) origin.
    pub fn new(root_url: Option<&str>) -> Result<Self, ConfigError> {
        let root_url = parse_root_url(root_url)?;
        debug!(root = %root_url, "root URL accepted");
        Ok(Self {
            root_url,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            concurrency: DEFAULT_CONCURRENCY,
            layout: SiteLayout::default(),
            connect_timeout: Duration::from_secs(CONNECT_TIMEOUT_SECS),
            read_timeout: Duration::from_secs(READ_TIMEOUT_SECS),
            accept_invalid_certs: false,
        })
    }

    /// Sets the destination directory.
    #[must_use]
    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    /// Sets the gate capacity.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidConcurrency`] outside `1..=100`.
    pub fn with_concurrency(mut self, concurrency: usize) -> Result<Self, ConfigError> {
        if !(MIN_CONCURRENCY..=MAX_CONCURRENCY).contains(&concurrency) {
            return Err(ConfigError::InvalidConcurrency { value: concurrency });
        }
        self.concurrency = concurrency;
        Ok(self)
    }

    /// Replaces the site layout.
    #[must_use]
    pub fn with_layout(mut self, layout: SiteLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Sets connect and read-idle timeouts, in seconds.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidTimeout`] outside `1..=3600`.
    pub fn with_timeouts(mut self, connect_secs: u64, read_secs: u64) -> Result<Self, ConfigError> {
        validate_timeout("connect timeout", connect_secs)?;
        validate_timeout("read timeout", read_secs)?;
        self.connect_timeout = Duration::from_secs(connect_secs);
        self.read_timeout = Duration::from_secs(read_secs);
        Ok(self)
    }

    /// Disables TLS certificate validation.
    #[must_use]
    pub fn with_accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    /// The site origin every category and item URL is rooted at.
    #[must_use]
    pub fn root_url(&self) -> &Url {
        &self.root_url
    }

    /// The destination directory.
    #[must_use]
    pub fn output_dir(&self) -> &PathBuf {
        &self.output_dir
    }

    /// The gate capacity.
    #[must_use]
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// The site layout.
    #[must_use]
    pub fn layout(&self) -> &SiteLayout {
        &self.layout
    }

    /// HTTP connect timeout.
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// HTTP read-idle timeout.
    #[must_use]
    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    /// Whether invalid TLS certificates are accepted.
    #[must_use]
    pub fn accept_invalid_certs(&self) -> bool {
        self.accept_invalid_certs
    }

    /// Absolute URL of the root catalog listing.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidRootUrl`] if the layout path does not join.
    pub fn catalog_url(&self) -> Result<Url, ConfigError> {
        self.join(&self.layout.catalog_path)
    }

    /// Absolute URL of the link-signing endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidRootUrl`] if the layout path does not join.
    pub fn signing_url(&self) -> Result<Url, ConfigError> {
        self.join(&self.layout.signing_path)
    }

    fn join(&self, path: &str) -> Result<Url, ConfigError> {
        self.root_url
            .join(path)
            .map_err(|e| ConfigError::InvalidRootUrl {
                value: format!("{}{path}", self.root_url),
                reason: e.to_string(),
            })
    }
}

fn parse_root_url(value: Option<&str>) -> Result<Url, ConfigError> {
    let value = value.map(str::trim).filter(|v| !v.is_empty());
    let Some(value) = value else {
        return Err(ConfigError::MissingRootUrl);
    };

    let invalid = |reason: &str| ConfigError::InvalidRootUrl {
        value: value.to_string(),
        reason: reason.to_string(),
    };

    let url = Url::parse(value).map_err(|e| invalid(&e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid("scheme must be http or https"));
    }
    if url.host_str().is_none() {
        return Err(invalid("missing host"));
    }
    // Layout paths are absolute, so anything past the origin would be lost.
    if url.path() != "/" || url.query().is_some() || url.fragment().is_some() {
        return Err(invalid("must be an origin"));
    }
    Ok(url)
}

fn validate_timeout(field: &'static str, value: u64) -> Result<(), ConfigError> {
    if !(1..=MAX_TIMEOUT_SECS).contains(&value) {
        return Err(ConfigError::InvalidTimeout { field, value });
    }
    Ok(())
}
