//! Shared HTTP client for page fetches, signing requests, and form posts.
//!
//! One [`HttpClient`] is built per run and cloned into every task; clones
//! share the underlying connection pool.

use std::path::Path;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::Client;
use tokio::fs::OpenOptions;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, instrument};

use super::page::ParsedPage;
use crate::config::{CONNECT_TIMEOUT_SECS, CrawlConfig, READ_TIMEOUT_SECS};
use crate::error::CrawlError;
use crate::user_agent;

/// HTTP client wrapper used by every stage of the pipeline.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient {
    /// Creates a client with default timeouts and certificate validation on.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the static
    /// configuration. This should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new() -> Self {
        let client = build_client(
            Duration::from_secs(CONNECT_TIMEOUT_SECS),
            Duration::from_secs(READ_TIMEOUT_SECS),
            false,
        )
        .expect("failed to build HTTP client with static configuration");
        Self { client }
    }

    /// Creates a client honoring the run's timeouts and TLS policy.
    ///
    /// # Errors
    ///
    /// Returns the reqwest builder error if the TLS backend cannot initialize.
    #[instrument(level = "debug", skip(config))]
    pub fn from_config(config: &CrawlConfig) -> Result<Self, reqwest::Error> {
        let client = build_client(
            config.connect_timeout(),
            config.read_timeout(),
            config.accept_invalid_certs(),
        )?;
        Ok(Self { client })
    }

    /// Fetches `url` and parses it as HTML.
    ///
    /// The body is decoded as UTF-8; invalid byte sequences are dropped.
    ///
    /// # Errors
    ///
    /// Returns a fetch-family [`CrawlError`] on network failure or non-2xx status.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn fetch_page(&self, url: &str) -> Result<ParsedPage, CrawlError> {
        info!("parsing {url}");
        let text = self.get_text(url, &[]).await?;
        Ok(ParsedPage::parse(&text))
    }

    /// Fetches `url` and runs `extract` over the parsed page.
    ///
    /// The parsed DOM never outlives this call, which keeps callers' futures
    /// `Send`.
    ///
    /// # Errors
    ///
    /// Same as [`fetch_page`](Self::fetch_page).
    pub async fn fetch_page_with<T, F>(&self, url: &str, extract: F) -> Result<T, CrawlError>
    where
        F: FnOnce(&ParsedPage) -> T,
    {
        let page = self.fetch_page(url).await?;
        Ok(extract(&page))
    }

    /// Issues a GET with optional query parameters and returns the decoded body.
    ///
    /// # Errors
    ///
    /// Returns a fetch-family [`CrawlError`] on network failure or non-2xx status.
    pub async fn get_text(&self, url: &str, query: &[(&str, &str)]) -> Result<String, CrawlError> {
        let mut request = self.client.get(url);
        if !query.is_empty() {
            request = request.query(query);
        }
        let response = send(request, url).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| CrawlError::network(url, e))?;
        Ok(decode_utf8_dropping_invalid(&bytes))
    }

    /// Posts `form` to `url` and appends the response body to `path`.
    ///
    /// The file is opened in append-create mode, so an existing file grows
    /// rather than being replaced. The body is written chunk by chunk as it
    /// arrives. Returns the number of bytes appended.
    ///
    /// # Errors
    ///
    /// Returns a fetch-family [`CrawlError`] for request/stream failures and
    /// [`CrawlError::Io`] for file system failures.
    #[instrument(skip(self, form), fields(url = %url, path = %path.display()))]
    pub async fn post_form_to_file(
        &self,
        url: &str,
        form: &[(String, String)],
        path: &Path,
    ) -> Result<u64, CrawlError> {
        let response = send(self.client.post(url).form(form), url).await?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
            .map_err(|e| CrawlError::io(path, e))?;

        let bytes = stream_to_file(file, response, url, path).await?;
        debug!(bytes, "response body appended");
        Ok(bytes)
    }
}

async fn send(request: reqwest::RequestBuilder, url: &str) -> Result<reqwest::Response, CrawlError> {
    let response = request
        .send()
        .await
        .map_err(|e| CrawlError::network(url, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(CrawlError::http_status(url, status.as_u16()));
    }
    Ok(response)
}

/// Streams response body to file, returning bytes written.
async fn stream_to_file(
    file: tokio::fs::File,
    response: reqwest::Response,
    url: &str,
    file_path: &Path,
) -> Result<u64, CrawlError> {
    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| CrawlError::network(url, e))?;

        writer
            .write_all(&chunk)
            .await
            .map_err(|e| CrawlError::io(file_path, e))?;

        bytes_written += chunk.len() as u64;
    }

    writer
        .flush()
        .await
        .map_err(|e| CrawlError::io(file_path, e))?;

    Ok(bytes_written)
}

/// Decodes UTF-8, silently dropping malformed sequences.
fn decode_utf8_dropping_invalid(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        out.push_str(chunk.valid());
    }
    out
}

fn build_client(
    connect_timeout: Duration,
    read_timeout: Duration,
    accept_invalid_certs: bool,
) -> Result<Client, reqwest::Error> {
    if accept_invalid_certs {
        tracing::warn!("TLS certificate validation is disabled");
    }
    Client::builder()
        .connect_timeout(connect_timeout)
        .read_timeout(read_timeout)
        .gzip(true)
        .user_agent(user_agent::default_user_agent())
        .tls_danger_accept_invalid_certs(accept_invalid_certs)
        .build()
}
