//! Item downloads: hidden-form scraping, signed-link exchange, and
//! append-mode streaming to disk.
//!
//! # Example
//!
//! ```no_run
//! use catalog_downloader::download::DownloadOrchestrator;
//! use catalog_downloader::fetch::HttpClient;
//! use catalog_downloader::signer::LinkSigner;
//! use url::Url;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let signer = LinkSigner::new(Url::parse("https://roms.example/en/emulators-roms/download/1/1")?);
//! let orchestrator = DownloadOrchestrator::new(HttpClient::new(), signer, "download-", "roms");
//! let item = Url::parse("https://roms.example/en/roms/nes/super-mario")?;
//! let outcome = orchestrator.download_one(&item).await?;
//! println!("appended {} bytes to {}", outcome.bytes, outcome.path.display());
//! # Ok(())
//! # }
//! ```

mod filename;
mod form;
mod orchestrator;

pub use filename::secure_filename;
pub use form::{DownloadForm, FILE_FIELD, download_page_url};
pub use orchestrator::{DownloadOrchestrator, DownloadOutcome};
