//! Per-item download: form scrape → sign → post → append to disk.

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};
use url::Url;

use super::filename::secure_filename;
use super::form::{DownloadForm, download_page_url};
use crate::error::{CrawlError, Stage, TaskFailure};
use crate::fetch::HttpClient;
use crate::signer::LinkSigner;

/// A finished download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadOutcome {
    /// The item page the download came from.
    pub item: Url,
    /// Where the bytes were appended.
    pub path: PathBuf,
    /// Bytes appended by this download.
    pub bytes: u64,
}

/// Downloads single items into an output directory.
#[derive(Debug, Clone)]
pub struct DownloadOrchestrator {
    client: HttpClient,
    signer: LinkSigner,
    download_prefix: String,
    output_dir: PathBuf,
}

impl DownloadOrchestrator {
    /// Creates an orchestrator writing into `output_dir`.
    #[must_use]
    pub fn new(
        client: HttpClient,
        signer: LinkSigner,
        download_prefix: impl Into<String>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            client,
            signer,
            download_prefix: download_prefix.into(),
            output_dir: output_dir.into(),
        }
    }

    /// The destination directory.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Downloads one item.
    ///
    /// A fresh signed link is requested for every call. The target file is
    /// appended to, never truncated.
    ///
    /// # Errors
    ///
    /// Returns a [`TaskFailure`] naming the stage that failed; nothing is
    /// retried.
    #[instrument(skip(self), fields(item = %item))]
    pub async fn download_one(&self, item: &Url) -> Result<DownloadOutcome, TaskFailure> {
        let fail = |stage: Stage| move |e: CrawlError| TaskFailure::new(stage, item.as_str(), e);

        let page_url =
            download_page_url(item, &self.download_prefix).map_err(fail(Stage::DownloadPage))?;
        let form = self
            .client
            .fetch_page_with(page_url.as_str(), DownloadForm::from_page)
            .await
            .map_err(fail(Stage::DownloadPage))?;
        let name = target_name(&form, page_url.as_str()).map_err(fail(Stage::DownloadPage))?;
        debug!(fields = form.fields().len(), %name, "download form parsed");

        let link = self
            .signer
            .signed_link(&self.client)
            .await
            .map_err(fail(Stage::Signing))?;

        let path = self.output_dir.join(&name);
        info!("downloading {name}");
        let bytes = self
            .client
            .post_form_to_file(link.as_str(), form.fields(), &path)
            .await
            .map_err(fail(Stage::Transfer))?;

        info!(path = %path.display(), bytes, "download complete");
        Ok(DownloadOutcome {
            item: item.clone(),
            path,
            bytes,
        })
    }
}

/// Sanitized target filename from the form's `file` field.
fn target_name(form: &DownloadForm, page_url: &str) -> Result<String, CrawlError> {
    if form.is_empty() {
        return Err(CrawlError::parse(page_url, "no hidden download form"));
    }
    let file = form
        .file()
        .ok_or_else(|| CrawlError::parse(page_url, "missing `file` field"))?;
    let name = secure_filename(file);
    if name.is_empty() {
        return Err(CrawlError::parse(
            page_url,
            format!("`file` value {file:?} has no usable filename"),
        ));
    }
    Ok(name)
}
