//! Fake catalog site served by wiremock.

#![allow(dead_code)]

use wiremock::matchers::{body_string_contains, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

pub const CATALOG_PATH: &str = "/en/all-roms/list/consoles";
pub const SIGNING_PATH: &str = "/en/emulators-roms/download/1/1";
pub const TRANSFER_PATH: &str = "/get";

/// A page of `title-5` anchors, optionally with a `>>` pagination control.
pub fn listing_html(hrefs: &[&str], last_page: Option<u32>) -> String {
    let mut html = String::from("<html><body><nav><a class=\"menu\" href=\"/en/help\">Help</a></nav>");
    for href in hrefs {
        html.push_str(&format!("<a class=\"title-5\" href=\"{href}\">{href}</a>"));
    }
    if let Some(last) = last_page {
        html.push_str(&format!(
            "<a class=\"alphabetP\" href=\"?page=2\">2</a><a class=\"alphabetP\" href=\"?page={last}\">&gt;&gt;</a>"
        ));
    }
    html.push_str("</body></html>");
    html
}

/// A download page carrying the given hidden fields.
pub fn download_page_html(fields: &[(&str, &str)]) -> String {
    let mut html = String::from("<html><body><form method=\"post\">");
    for (name, value) in fields {
        html.push_str(&format!("<input type=\"hidden\" name=\"{name}\" value=\"{value}\">"));
    }
    html.push_str("<input type=\"submit\" value=\"Download\"></form></body></html>");
    html
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "text/html; charset=utf-8")
        .set_body_string(body)
}

/// Serves the root catalog listing.
pub async fn mount_catalog(server: &MockServer, categories: &[&str]) {
    Mock::given(method("GET"))
        .and(path(CATALOG_PATH))
        .respond_with(html(listing_html(categories, None)))
        .mount(server)
        .await;
}

/// Serves a category whose pages hold `pages[i]` item hrefs.
///
/// The bare category URL (count discovery) and each `?page=N` are expected
/// exactly once.
pub async fn mount_category(server: &MockServer, category: &str, pages: &[&[&str]]) {
    let last_page = (pages.len() > 1).then(|| u32::try_from(pages.len()).unwrap_or(u32::MAX));

    Mock::given(method("GET"))
        .and(path(category))
        .and(query_param_is_missing("page"))
        .respond_with(html(listing_html(pages.first().copied().unwrap_or(&[]), last_page)))
        .expect(1)
        .named(format!("{category} count discovery"))
        .mount(server)
        .await;

    for (index, hrefs) in pages.iter().enumerate() {
        let page = (index + 1).to_string();
        Mock::given(method("GET"))
            .and(path(category))
            .and(query_param("page", page.as_str()))
            .respond_with(html(listing_html(hrefs, last_page)))
            .expect(1)
            .named(format!("{category} page {page}"))
            .mount(server)
            .await;
    }
}

/// Serves the derived download page for an item.
pub async fn mount_download_page(server: &MockServer, download_path: &str, fields: &[(&str, &str)]) {
    Mock::given(method("GET"))
        .and(path(download_path))
        .respond_with(html(download_page_html(fields)))
        .mount(server)
        .await;
}

/// Whether the request's `k`/`t` query parameters satisfy `t == md5(k)`
/// with a 13-character `k`.
pub fn has_valid_signature(request: &Request) -> bool {
    let mut k = None;
    let mut t = None;
    for (key, value) in request.url.query_pairs() {
        match key.as_ref() {
            "k" => k = Some(value.into_owned()),
            "t" => t = Some(value.into_owned()),
            _ => {}
        }
    }
    match (k, t) {
        (Some(k), Some(t)) => {
            k.len() == 13
                && t.len() == 32
                && t.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase())
                && t == format!("{:x}", md5::compute(k.as_bytes()))
        }
        _ => false,
    }
}

fn signer_mock(server: &MockServer) -> Mock {
    let link = format!("{}{TRANSFER_PATH}", server.uri());
    Mock::given(method("GET"))
        .and(path(SIGNING_PATH))
        .and(has_valid_signature)
        .respond_with(
            ResponseTemplate::new(200).set_body_string(format!(r#"{{"link": "{link}"}}"#)),
        )
}

/// Serves the signing endpoint, handing out `<server>/get` links.
///
/// Only correctly signed requests are answered.
pub async fn mount_signer(server: &MockServer) {
    signer_mock(server).mount(server).await;
}

/// Like [`mount_signer`], verifying on drop that exactly `calls` signing
/// requests arrived.
pub async fn mount_signer_expecting(server: &MockServer, calls: u64) {
    signer_mock(server)
        .expect(calls)
        .named("signing endpoint")
        .mount(server)
        .await;
}

/// Serves the file body for posts whose form carries `file=<name>`.
pub async fn mount_transfer(server: &MockServer, file: &str, body: &[u8]) {
    Mock::given(method("POST"))
        .and(path(TRANSFER_PATH))
        .and(body_string_contains(format!("file={file}")))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.to_vec()))
        .mount(server)
        .await;
}
