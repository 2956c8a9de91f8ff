//! Page fetching: HTTP GET, tolerant UTF-8 decoding, and HTML element lookup.

mod client;
mod page;

pub use client::HttpClient;
pub use page::{PageElement, ParsedPage};
