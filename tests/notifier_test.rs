//! Catalog notifier tests against a mock HTTP catalog.

use playready::config::CatalogConfig;
use playready::notifications::{self, CatalogNotifier, PlexNotifier};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn catalog(url: String) -> CatalogConfig {
    CatalogConfig {
        url,
        token: "secret-token".to_string(),
        timeout_secs: 2,
        ..CatalogConfig::default()
    }
}

#[tokio::test]
async fn test_refresh_request_carries_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/library/sections/2/refresh"))
        .and(header("X-Plex-Token", "secret-token"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    PlexNotifier::new(&catalog(server.uri())).notify(2).await;
}

#[tokio::test]
async fn test_custom_token_header() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/library/sections/7/refresh"))
        .and(header("X-Api-Key", "secret-token"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let config = CatalogConfig {
        token_header: "X-Api-Key".to_string(),
        ..catalog(server.uri())
    };
    PlexNotifier::new(&config).notify(7).await;
}

#[tokio::test]
async fn test_error_status_is_swallowed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    PlexNotifier::new(&catalog(server.uri())).notify(1).await;
}

#[tokio::test]
async fn test_unauthorized_is_swallowed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    PlexNotifier::new(&catalog(server.uri())).notify(1).await;
}

#[tokio::test]
async fn test_disabled_catalog_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let config = CatalogConfig {
        enabled: false,
        ..catalog(server.uri())
    };
    notifications::from_config(&config).notify(1).await;
}
