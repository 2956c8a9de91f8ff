//! Two-phase driver: enumerate every item, then download every item.
//!
//! ```text
//! Init → EnumeratingCategories → EnumeratingItems → Downloading → Done
//! ```
//!
//! The root catalog page is fetched once, outside the gate. Category walks
//! and item downloads each run as their own task behind one shared
//! [`ConcurrencyGate`]; a failing task is recorded and its siblings carry on.

use std::future::Future;
use std::path::PathBuf;

use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::config::{ConfigError, CrawlConfig};
use crate::crawler::{CatalogCrawler, CategoryListing};
use crate::download::{DownloadOrchestrator, DownloadOutcome};
use crate::error::{CrawlError, Stage, TaskFailure};
use crate::fetch::HttpClient;
use crate::gate::ConcurrencyGate;
use crate::signer::LinkSigner;

/// Driver lifecycle. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PipelineState {
    /// Client and output directory being prepared.
    Init,
    /// Reading the root catalog page.
    EnumeratingCategories,
    /// Walking categories for item URLs.
    EnumeratingItems,
    /// Downloading items.
    Downloading,
    /// Every task has settled.
    Done,
}

/// Conditions that stop a run as a whole.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// Configuration rejected before any work started.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The shared HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// The output directory could not be created.
    #[error("failed to create output directory {path}: {source}")]
    OutputDir {
        /// The directory that could not be created.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The root catalog page could not be fetched.
    #[error("root catalog unavailable: {0}")]
    Catalog(#[source] CrawlError),
}

/// Summary of a finished run.
#[derive(Debug, Default)]
pub struct RunReport {
    /// Categories found on the root page.
    pub categories: usize,
    /// Item URLs enumerated across all categories (duplicates included).
    pub items: usize,
    /// Downloads that finished.
    pub completed: usize,
    /// Bytes appended across all finished downloads.
    pub bytes: u64,
    /// Every contained failure, categories first, then downloads.
    pub failures: Vec<TaskFailure>,
    /// The gate was closed mid-run; tasks still queued were not started.
    pub interrupted: bool,
}

impl RunReport {
    /// Downloads that did not finish.
    #[must_use]
    pub fn failed_downloads(&self) -> usize {
        self.failures
            .iter()
            .filter(|f| matches!(f.stage, Stage::DownloadPage | Stage::Signing | Stage::Transfer))
            .count()
    }
}

/// Wires crawler, orchestrator, and gate together for one run.
#[derive(Debug)]
pub struct Pipeline {
    catalog_url: Url,
    output_dir: PathBuf,
    crawler: CatalogCrawler,
    orchestrator: DownloadOrchestrator,
    gate: ConcurrencyGate,
    state: PipelineState,
}

impl Pipeline {
    /// Builds the shared client and stage components.
    ///
    /// # Errors
    ///
    /// [`RunError::Config`] if the layout paths do not join onto the root,
    /// [`RunError::Client`] if the HTTP client cannot be built.
    pub fn new(config: &CrawlConfig) -> Result<Self, RunError> {
        let client = HttpClient::from_config(config).map_err(RunError::Client)?;
        Self::with_client(config, client)
    }

    /// Like [`new`](Self::new) with a caller-supplied client.
    ///
    /// # Errors
    ///
    /// [`RunError::Config`] if the layout paths do not join onto the root.
    pub fn with_client(config: &CrawlConfig, client: HttpClient) -> Result<Self, RunError> {
        let layout = config.layout().clone();
        let signer = LinkSigner::new(config.signing_url()?);
        let orchestrator = DownloadOrchestrator::new(
            client.clone(),
            signer,
            layout.download_prefix.clone(),
            config.output_dir().clone(),
        );
        let crawler = CatalogCrawler::new(client, config.root_url().clone(), layout);

        debug!(
            concurrency = config.concurrency(),
            output_dir = %config.output_dir().display(),
            "pipeline assembled"
        );
        Ok(Self {
            catalog_url: config.catalog_url()?,
            output_dir: config.output_dir().clone(),
            crawler,
            orchestrator,
            gate: ConcurrencyGate::new(config.concurrency()),
            state: PipelineState::Init,
        })
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Handle to the shared gate.
    ///
    /// Closing it stops the run from starting new tasks; tasks already
    /// running finish and queued ones are reported as aborted.
    #[must_use]
    pub fn gate(&self) -> ConcurrencyGate {
        self.gate.clone()
    }

    /// Runs every phase to completion.
    ///
    /// Per-task failures land in the report; only the root page and the
    /// output directory can fail the run.
    ///
    /// # Errors
    ///
    /// See [`RunError`].
    #[instrument(skip(self), fields(catalog = %self.catalog_url))]
    pub async fn run(&mut self) -> Result<RunReport, RunError> {
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|source| RunError::OutputDir {
                path: self.output_dir.clone(),
                source,
            })?;

        let mut report = RunReport::default();

        self.advance(PipelineState::EnumeratingCategories);
        let categories = self
            .crawler
            .discover_categories(&self.catalog_url)
            .await
            .map_err(RunError::Catalog)?;
        report.categories = categories.len();

        self.advance(PipelineState::EnumeratingItems);
        let (items, crawl_failures) = self.enumerate_items(categories).await;
        report.items = items.len();
        report.failures.extend(crawl_failures);

        self.advance(PipelineState::Downloading);
        let (outcomes, download_failures) = self.download_items(items).await;
        report.completed = outcomes.len();
        report.bytes = outcomes.iter().map(|o| o.bytes).sum();
        report.failures.extend(download_failures);
        report.interrupted = self.gate.is_closed();

        self.advance(PipelineState::Done);
        info!(
            categories = report.categories,
            items = report.items,
            completed = report.completed,
            failed = report.failures.len(),
            bytes = report.bytes,
            interrupted = report.interrupted,
            "run complete"
        );
        Ok(report)
    }

    /// Walks every category behind the gate and flattens their items in
    /// category order.
    pub async fn enumerate_items(&self, categories: Vec<Url>) -> (Vec<Url>, Vec<TaskFailure>) {
        let crawler = self.crawler.clone();
        let results = run_gated(&self.gate, categories, move |category| {
            let crawler = crawler.clone();
            async move {
                crawler
                    .discover_items(&category)
                    .await
                    .map_err(|e| TaskFailure::new(Stage::CategoryPage, category.as_str(), e))
            }
        })
        .await;

        let mut items = Vec::new();
        let mut failures = Vec::new();
        for result in results {
            match result {
                Ok(CategoryListing {
                    items: found,
                    failures: page_failures,
                    ..
                }) => {
                    items.extend(found);
                    failures.extend(page_failures);
                }
                Err(failure) => {
                    warn!(%failure, "category failed");
                    failures.push(failure);
                }
            }
        }
        info!(items = items.len(), "item enumeration complete");
        (items, failures)
    }

    /// Downloads every item behind the gate.
    pub async fn download_items(&self, items: Vec<Url>) -> (Vec<DownloadOutcome>, Vec<TaskFailure>) {
        let orchestrator = self.orchestrator.clone();
        let results = run_gated(&self.gate, items, move |item| {
            let orchestrator = orchestrator.clone();
            async move { orchestrator.download_one(&item).await }
        })
        .await;

        let mut outcomes = Vec::new();
        let mut failures = Vec::new();
        for result in results {
            match result {
                Ok(outcome) => outcomes.push(outcome),
                Err(failure) => {
                    warn!(%failure, "download failed");
                    failures.push(failure);
                }
            }
        }
        (outcomes, failures)
    }

    fn advance(&mut self, next: PipelineState) {
        debug_assert!(next > self.state, "{:?} -> {next:?} moves backward", self.state);
        info!(from = ?self.state, to = ?next, "pipeline state");
        self.state = next;
    }
}

/// Spawns `task` for each URL once a gate slot is free.
///
/// The slot is held until the task finishes. Results come back indexed by
/// submission order; a task that panics becomes an aborted [`TaskFailure`].
async fn run_gated<T, F, Fut>(
    gate: &ConcurrencyGate,
    urls: Vec<Url>,
    task: F,
) -> Vec<Result<T, TaskFailure>>
where
    T: Send + 'static,
    F: Fn(Url) -> Fut,
    Fut: Future<Output = Result<T, TaskFailure>> + Send + 'static,
{
    let mut handles = Vec::with_capacity(urls.len());

    for url in urls {
        let label = url.to_string();
        let Ok(permit) = gate.acquire().await else {
            debug!(url = %label, "gate closed, task not started");
            handles.push((label, None));
            continue;
        };
        let work = task(url);
        handles.push((
            label,
            Some(tokio::spawn(async move {
                let _permit = permit;
                work.await
            })),
        ));
    }

    debug!(task_count = handles.len(), "waiting for tasks to settle");

    let mut results = Vec::with_capacity(handles.len());
    for (label, handle) in handles {
        let result = match handle {
            Some(handle) => handle.await.unwrap_or_else(|e| {
                warn!(url = %label, error = %e, "task panicked");
                Err(TaskFailure::aborted(label))
            }),
            None => Err(TaskFailure::aborted(label)),
        };
        results.push(result);
    }
    results
}
