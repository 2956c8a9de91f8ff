//! Catalog enumeration: root listing → categories → paginated item pages.
//!
//! Page 1 of every category is fetched twice: once to read the pagination
//! control, once during enumeration. Item URLs are not deduplicated.

use futures_util::future::join_all;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::config::SiteLayout;
use crate::error::{CrawlError, Stage, TaskFailure};
use crate::fetch::{HttpClient, ParsedPage};

/// Items enumerated from one category.
#[derive(Debug)]
pub struct CategoryListing {
    /// The category that was walked.
    pub category: Url,
    /// Page count read from the pagination control.
    pub pages: u32,
    /// Item URLs in page order, then document order within a page.
    pub items: Vec<Url>,
    /// Pages that could not be fetched.
    pub failures: Vec<TaskFailure>,
}

/// Walks the catalog to find categories and their items.
#[derive(Debug, Clone)]
pub struct CatalogCrawler {
    client: HttpClient,
    root: Url,
    layout: SiteLayout,
}

impl CatalogCrawler {
    /// Creates a crawler resolving hrefs against `root`.
    #[must_use]
    pub fn new(client: HttpClient, root: Url, layout: SiteLayout) -> Self {
        Self {
            client,
            root,
            layout,
        }
    }

    /// Lists the category URLs on the root catalog page.
    ///
    /// # Errors
    ///
    /// Fetch-family errors for the root page.
    #[instrument(skip(self), fields(url = %catalog_url))]
    pub async fn discover_categories(&self, catalog_url: &Url) -> Result<Vec<Url>, CrawlError> {
        let categories = self
            .client
            .fetch_page_with(catalog_url.as_str(), |page| {
                anchor_urls(page, &self.layout.item_anchor_class, &self.root)
            })
            .await?;
        info!(count = categories.len(), "categories discovered");
        Ok(categories)
    }

    /// Reads the number of pages in `category` from its first page.
    ///
    /// Returns 1 when there is no pagination control.
    ///
    /// # Errors
    ///
    /// Fetch-family errors for the category page.
    pub async fn page_count(&self, category: &Url) -> Result<u32, CrawlError> {
        self.client
            .fetch_page_with(category.as_str(), |page| {
                pagination_count(page, &self.layout, category)
            })
            .await
    }

    /// Enumerates every item in `category`, fetching its pages concurrently.
    ///
    /// A page that fails to load is recorded in the listing's failures and
    /// does not affect its siblings.
    ///
    /// # Errors
    ///
    /// Fetch-family errors for the page-count request only.
    #[instrument(skip(self), fields(category = %category))]
    pub async fn discover_items(&self, category: &Url) -> Result<CategoryListing, CrawlError> {
        let pages = self.page_count(category).await?;
        debug!(pages, "pagination resolved");

        let page_urls: Vec<Url> = (1..=pages)
            .map(|index| page_url(category, &self.layout.page_param, index))
            .collect();

        // join_all yields results in submission order, i.e. page order.
        let results = join_all(page_urls.iter().map(|url| self.items_on_page(url))).await;

        let mut items = Vec::new();
        let mut failures = Vec::new();
        for (url, result) in page_urls.iter().zip(results) {
            match result {
                Ok(found) => items.extend(found),
                Err(e) => {
                    warn!(page = %url, error = %e, "listing page failed");
                    failures.push(TaskFailure::new(Stage::ListingPage, url.as_str(), e));
                }
            }
        }

        info!(pages, items = items.len(), failed_pages = failures.len(), "category enumerated");
        Ok(CategoryListing {
            category: category.clone(),
            pages,
            items,
            failures,
        })
    }

    /// Item URLs on a single listing page.
    ///
    /// # Errors
    ///
    /// Fetch-family errors for the page.
    pub async fn items_on_page(&self, page: &Url) -> Result<Vec<Url>, CrawlError> {
        self.client
            .fetch_page_with(page.as_str(), |parsed| {
                anchor_urls(parsed, &self.layout.item_anchor_class, &self.root)
            })
            .await
    }
}

/// `category` with the page query parameter appended.
#[must_use]
pub fn page_url(category: &Url, param: &str, index: u32) -> Url {
    let mut url = category.clone();
    url.query_pairs_mut()
        .append_pair(param, &index.to_string());
    url
}

/// Absolute URLs of the anchors carrying `class`, in document order.
///
/// Anchors that resolve outside the root's origin are skipped.
fn anchor_urls(page: &ParsedPage, class: &str, root: &Url) -> Vec<Url> {
    page.find_all("a", "class", class)
        .iter()
        .filter_map(|anchor| {
            let href = anchor.attr("href")?;
            match root.join(href) {
                Ok(url) if url.origin() == root.origin() => Some(url),
                Ok(url) => {
                    warn!(href, resolved = %url, "skipping off-site anchor");
                    None
                }
                Err(e) => {
                    warn!(href, error = %e, "skipping unresolvable anchor");
                    None
                }
            }
        })
        .collect()
}

/// Last page index from the pagination control, or 1.
fn pagination_count(page: &ParsedPage, layout: &SiteLayout, category: &Url) -> u32 {
    let last = page
        .find_all("a", "class", &layout.pagination_class)
        .into_iter()
        .find(|anchor| anchor.text() == layout.last_page_text);

    let Some(anchor) = last else {
        return 1;
    };
    let href = anchor.attr("href").unwrap_or_default();
    match parse_page_index(href) {
        Some(index) => index.max(1),
        None => {
            warn!(%category, href, "unreadable last-page index, assuming one page");
            1
        }
    }
}

/// Integer after the last `=` of a pagination href.
fn parse_page_index(href: &str) -> Option<u32> {
    href.rsplit('=').next()?.trim().parse().ok()
}
