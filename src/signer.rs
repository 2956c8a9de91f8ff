//! Time-keyed download link signing.
//!
//! The site hands out one-time download links in exchange for a time key `k`
//! and its MD5 digest `t`. No secret is involved: the server recomputes the
//! digest from the `k` it receives and checks it against its own clock.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::Deserialize;
use tracing::{debug, instrument};
use url::Url;

use crate::error::CrawlError;
use crate::fetch::HttpClient;

/// Width every time key is padded to.
pub const TIME_KEY_LEN: usize = 13;

/// A signed `(k, t)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningToken {
    /// Zero-padded decimal timestamp.
    pub k: String,
    /// Lowercase hex MD5 of `k`.
    pub t: String,
}

impl SigningToken {
    /// Signs the given time since the Unix epoch.
    #[must_use]
    pub fn at(since_epoch: Duration) -> Self {
        let k = time_key(since_epoch);
        let t = format!("{:x}", md5::compute(k.as_bytes()));
        Self { k, t }
    }
}

#[derive(Debug, Deserialize)]
struct LinkResponse {
    link: Option<String>,
}

/// Exchanges time keys for single-use download links.
#[derive(Debug, Clone)]
pub struct LinkSigner {
    endpoint: Url,
}

impl LinkSigner {
    /// Creates a signer that queries `endpoint`.
    #[must_use]
    pub fn new(endpoint: Url) -> Self {
        Self { endpoint }
    }

    /// The signing endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Signs the current wall-clock time.
    #[must_use]
    pub fn sign(&self) -> SigningToken {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        SigningToken::at(now)
    }

    /// Trades `token` for a download link.
    ///
    /// A relative `link` is resolved against the endpoint.
    ///
    /// # Errors
    ///
    /// Fetch-family errors from the GET, or [`CrawlError::Signing`] when the
    /// body is not JSON or has no usable `link` string.
    #[instrument(skip(self, client), fields(endpoint = %self.endpoint, k = %token.k))]
    pub async fn exchange(
        &self,
        token: &SigningToken,
        client: &HttpClient,
    ) -> Result<Url, CrawlError> {
        let endpoint = self.endpoint.as_str();
        let body = client
            .get_text(endpoint, &[("k", token.k.as_str()), ("t", token.t.as_str())])
            .await?;

        let parsed: LinkResponse = serde_json::from_str(&body)
            .map_err(|e| CrawlError::signing(endpoint, format!("malformed JSON: {e}")))?;
        let link = parsed
            .link
            .filter(|link| !link.trim().is_empty())
            .ok_or_else(|| CrawlError::signing(endpoint, "response has no `link` field"))?;

        let url = self
            .endpoint
            .join(link.trim())
            .map_err(|_| CrawlError::signing(endpoint, format!("unusable link {link:?}")))?;
        debug!(link = %url, "signed link issued");
        Ok(url)
    }

    /// Signs now and exchanges the fresh token.
    ///
    /// # Errors
    ///
    /// See [`exchange`](Self::exchange).
    pub async fn signed_link(&self, client: &HttpClient) -> Result<Url, CrawlError> {
        let token = self.sign();
        self.exchange(&token, client).await
    }
}

/// Renders seconds since the epoch with two fractional digits, left-padded
/// with zeros to [`TIME_KEY_LEN`] characters.
///
/// Representations already at least that long are left as is.
#[must_use]
pub fn time_key(since_epoch: Duration) -> String {
    let raw = format!(
        "{}.{:02}",
        since_epoch.as_secs(),
        since_epoch.subsec_millis() / 10
    );
    format!("{raw:0>TIME_KEY_LEN$}")
}
