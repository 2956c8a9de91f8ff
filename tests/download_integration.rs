//! Integration tests for the per-item download flow.
//!
//! These tests drive form scraping, link signing, and the append-mode
//! transfer against a mock site.

mod support;

use catalog_downloader::{
    CrawlError, DownloadOrchestrator, HttpClient, LinkSigner, Stage,
};
use support::{mount_download_page, mount_signer, mount_transfer};
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ITEM_PATH: &str = "/en/roms/nes/mario";
const DOWNLOAD_PATH: &str = "/en/roms/download-nes/mario";

fn orchestrator(server: &MockServer, dir: &TempDir) -> DownloadOrchestrator {
    let signing = Url::parse(&format!("{}{}", server.uri(), support::SIGNING_PATH))
        .expect("signing url");
    DownloadOrchestrator::new(
        HttpClient::new(),
        LinkSigner::new(signing),
        "download-",
        dir.path(),
    )
}

fn item(server: &MockServer) -> Url {
    Url::parse(&format!("{}{ITEM_PATH}", server.uri())).expect("item url")
}

#[tokio::test]
async fn test_download_posts_every_hidden_field() {
    let server = MockServer::start().await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    mount_download_page(&server, DOWNLOAD_PATH, &[("file", "game.rom"), ("session", "abc")]).await;
    mount_signer(&server).await;
    Mock::given(method("POST"))
        .and(path(support::TRANSFER_PATH))
        .and(body_string_contains("file=game.rom"))
        .and(body_string_contains("session=abc"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"ROMDATA".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = orchestrator(&server, &temp_dir)
        .download_one(&item(&server))
        .await
        .expect("download should succeed");

    assert_eq!(outcome.path, temp_dir.path().join("game.rom"));
    assert_eq!(outcome.bytes, 7);
    assert_eq!(outcome.item, item(&server));
    let written = std::fs::read(&outcome.path).expect("read output");
    assert_eq!(written, b"ROMDATA");
}

#[tokio::test]
async fn test_download_appends_to_existing_file() {
    let server = MockServer::start().await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let existing = temp_dir.path().join("game.rom");
    std::fs::write(&existing, [b'a'; 10]).expect("seed file");

    mount_download_page(&server, DOWNLOAD_PATH, &[("file", "game.rom")]).await;
    mount_signer(&server).await;
    mount_transfer(&server, "game.rom", &[b'b'; 20]).await;

    let outcome = orchestrator(&server, &temp_dir)
        .download_one(&item(&server))
        .await
        .expect("download should succeed");

    assert_eq!(outcome.bytes, 20);
    let written = std::fs::read(&existing).expect("read output");
    assert_eq!(written.len(), 30);
    assert!(written[..10].iter().all(|&b| b == b'a'));
    assert!(written[10..].iter().all(|&b| b == b'b'));
}

#[tokio::test]
async fn test_download_sanitizes_target_name() {
    let server = MockServer::start().await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    mount_download_page(&server, DOWNLOAD_PATH, &[("file", "../Super Mario Bros.nes")]).await;
    mount_signer(&server).await;
    Mock::given(method("POST"))
        .and(path(support::TRANSFER_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"x".to_vec()))
        .mount(&server)
        .await;

    let outcome = orchestrator(&server, &temp_dir)
        .download_one(&item(&server))
        .await
        .expect("download should succeed");

    assert_eq!(outcome.path, temp_dir.path().join("Super_Mario_Bros.nes"));
    assert!(outcome.path.exists());
}

#[tokio::test]
async fn test_download_missing_file_field_skips_transfer() {
    let server = MockServer::start().await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    mount_download_page(&server, DOWNLOAD_PATH, &[("session", "abc")]).await;
    mount_signer(&server).await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let failure = orchestrator(&server, &temp_dir)
        .download_one(&item(&server))
        .await
        .expect_err("download should fail");

    assert_eq!(failure.stage, Stage::DownloadPage);
    assert!(matches!(failure.error, Some(CrawlError::Parse { .. })));
    assert_eq!(std::fs::read_dir(temp_dir.path()).expect("list dir").count(), 0);
}

#[tokio::test]
async fn test_download_page_not_found() {
    let server = MockServer::start().await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");

    let failure = orchestrator(&server, &temp_dir)
        .download_one(&item(&server))
        .await
        .expect_err("download should fail");

    assert_eq!(failure.stage, Stage::DownloadPage);
    assert!(matches!(
        failure.error,
        Some(CrawlError::HttpStatus { status: 404, .. })
    ));
}

#[tokio::test]
async fn test_download_signing_failure() {
    let server = MockServer::start().await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    mount_download_page(&server, DOWNLOAD_PATH, &[("file", "game.rom")]).await;
    Mock::given(method("GET"))
        .and(path(support::SIGNING_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .mount(&server)
        .await;

    let failure = orchestrator(&server, &temp_dir)
        .download_one(&item(&server))
        .await
        .expect_err("download should fail");

    assert_eq!(failure.stage, Stage::Signing);
    assert!(matches!(failure.error, Some(CrawlError::Signing { .. })));
    assert!(!temp_dir.path().join("game.rom").exists());
}

#[tokio::test]
async fn test_download_transfer_error_status() {
    let server = MockServer::start().await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    mount_download_page(&server, DOWNLOAD_PATH, &[("file", "game.rom")]).await;
    mount_signer(&server).await;
    Mock::given(method("POST"))
        .and(path(support::TRANSFER_PATH))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let failure = orchestrator(&server, &temp_dir)
        .download_one(&item(&server))
        .await
        .expect_err("download should fail");

    assert_eq!(failure.stage, Stage::Transfer);
    assert!(matches!(
        failure.error,
        Some(CrawlError::HttpStatus { status: 403, .. })
    ));
}
