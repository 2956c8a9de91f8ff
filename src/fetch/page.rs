//! Parsed HTML page with attribute-based element lookup.
//!
//! [`ParsedPage`] wraps a `scraper` document. It is not `Send`, so callers
//! extract owned data from it before their next `.await`.

use scraper::{ElementRef, Html, Selector};

/// An element found on a page, reduced to the parts the crawler reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageElement {
    attrs: Vec<(String, String)>,
    classes: Vec<String>,
    text: String,
}

impl PageElement {
    fn from_ref(element: ElementRef<'_>) -> Self {
        let value = element.value();
        Self {
            attrs: value
                .attrs()
                .map(|(name, val)| (name.to_string(), val.to_string()))
                .collect(),
            classes: value.classes().map(str::to_string).collect(),
            text: element.text().collect::<String>().trim().to_string(),
        }
    }

    /// Value of attribute `name`, if present.
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Whether the `class` attribute lists `class`.
    #[must_use]
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    /// Concatenated, trimmed text content.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// A fetched page, parsed into a DOM.
pub struct ParsedPage {
    document: Html,
}

impl std::fmt::Debug for ParsedPage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParsedPage").finish_non_exhaustive()
    }
}

impl ParsedPage {
    /// Parses an HTML document.
    #[must_use]
    pub fn parse(html: &str) -> Self {
        Self {
            document: Html::parse_document(html),
        }
    }

    /// All elements of tag `tag`, in document order.
    ///
    /// An unparseable tag name yields no elements.
    #[must_use]
    pub fn elements(&self, tag: &str) -> Vec<PageElement> {
        let Ok(selector) = Selector::parse(tag) else {
            return Vec::new();
        };
        self.document
            .select(&selector)
            .map(PageElement::from_ref)
            .collect()
    }

    /// Elements of tag `tag` whose attribute `attr` contains `value`.
    ///
    /// For `class` the match is against the whitespace-separated class list;
    /// for any other attribute it is exact.
    #[must_use]
    pub fn find_all(&self, tag: &str, attr: &str, value: &str) -> Vec<PageElement> {
        self.elements(tag)
            .into_iter()
            .filter(|element| {
                if attr == "class" {
                    element.has_class(value)
                } else {
                    element.attr(attr) == Some(value)
                }
            })
            .collect()
    }
}
