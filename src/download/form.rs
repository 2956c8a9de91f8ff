//! Hidden download form and download sub-page derivation.

use url::Url;

use crate::error::CrawlError;
use crate::fetch::ParsedPage;

/// Name of the form field carrying the suggested filename.
pub const FILE_FIELD: &str = "file";

/// Hidden-input fields of an item's download page, in document order.
///
/// A repeated name keeps its position and takes the later value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadForm {
    fields: Vec<(String, String)>,
}

impl DownloadForm {
    /// Collects every `<input type="hidden">` with a `name`.
    ///
    /// A missing `value` is sent as an empty string.
    #[must_use]
    pub fn from_page(page: &ParsedPage) -> Self {
        let mut form = Self::default();
        for input in page.find_all("input", "type", "hidden") {
            let Some(name) = input.attr("name") else {
                continue;
            };
            form.insert(name, input.attr("value").unwrap_or_default());
        }
        form
    }

    /// Sets `name` to `value`.
    pub fn insert(&mut self, name: &str, value: &str) {
        match self.fields.iter_mut().find(|(key, _)| key == name) {
            Some(slot) => slot.1 = value.to_string(),
            None => self.fields.push((name.to_string(), value.to_string())),
        }
    }

    /// Value of `name`, if present.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// The suggested filename.
    #[must_use]
    pub fn file(&self) -> Option<&str> {
        self.get(FILE_FIELD)
    }

    /// Whether the page had no hidden fields at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The fields as POST payload.
    #[must_use]
    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }
}

/// Derives the download sub-page of an item: `.../cat/item` → `.../download-cat/item`.
///
/// # Errors
///
/// Returns [`CrawlError::InvalidUrl`] when the item path has fewer than two segments.
pub fn download_page_url(item: &Url, prefix: &str) -> Result<Url, CrawlError> {
    let segments: Vec<&str> = item
        .path_segments()
        .map(Iterator::collect)
        .unwrap_or_default();
    if segments.len() < 2 || segments.iter().all(|s| s.is_empty()) {
        return Err(CrawlError::invalid_url(item.as_str()));
    }

    let split = segments.len() - 2;
    let mut path = String::new();
    for segment in &segments[..split] {
        path.push('/');
        path.push_str(segment);
    }
    path.push('/');
    path.push_str(prefix);
    path.push_str(segments[split]);
    path.push('/');
    path.push_str(segments[split + 1]);

    let mut url = item.clone();
    url.set_path(&path);
    Ok(url)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_download_page_url_inserts_prefix() {
        let item = Url::parse("https://roms.example/en/roms/nes/super-mario").unwrap();
        assert_eq!(
            download_page_url(&item, "download-").unwrap().as_str(),
            "https://roms.example/en/roms/download-nes/super-mario"
        );
    }

    #[test]
    fn test_download_page_url_two_segments() {
        let item = Url::parse("https://roms.example/nes/mario").unwrap();
        assert_eq!(
            download_page_url(&item, "download-").unwrap().as_str(),
            "https://roms.example/download-nes/mario"
        );
    }

    #[test]
    fn test_download_page_url_keeps_query() {
        let item = Url::parse("https://roms.example/a/nes/mario?id=3").unwrap();
        assert_eq!(
            download_page_url(&item, "download-").unwrap().as_str(),
            "https://roms.example/a/download-nes/mario?id=3"
        );
    }

    #[test]
    fn test_download_page_url_rejects_short_paths() {
        let item = Url::parse("https://roms.example/mario").unwrap();
        assert!(matches!(
            download_page_url(&item, "download-"),
            Err(CrawlError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_form_collects_hidden_inputs_only() {
        let page = ParsedPage::parse(
            r#"<form>
                 <input type="hidden" name="file" value="game.rom">
                 <input type="hidden" name="session" value="abc">
                 <input type="hidden" name="empty">
                 <input type="hidden" value="orphan">
                 <input type="text" name="search" value="x">
               </form>"#,
        );
        let form = DownloadForm::from_page(&page);
        assert_eq!(form.file(), Some("game.rom"));
        assert_eq!(form.get("session"), Some("abc"));
        assert_eq!(form.get("empty"), Some(""));
        assert_eq!(form.get("search"), None);
        assert_eq!(form.fields().len(), 3);
    }

    #[test]
    fn test_form_repeated_name_takes_last_value() {
        let mut form = DownloadForm::default();
        form.insert("file", "a.rom");
        form.insert("id", "1");
        form.insert("file", "b.rom");
        assert_eq!(
            form.fields(),
            [
                ("file".to_string(), "b.rom".to_string()),
                ("id".to_string(), "1".to_string())
            ]
        );
    }
}
