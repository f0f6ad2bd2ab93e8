//! End-to-end tests of the client stack against a mock server.

use mockito::{Matcher, Server};
use news_sources::client::{CacheConfig, ClientConfig, NewsApiClient};
use news_sources::data::{DefaultNewsSourcesRepository, NewsSourcesRepository};
use news_sources::error::{Fault, HttpFault, NewsError};
use news_sources::scope::CancellationToken;
use news_sources::{ErrorKind, Resource};
use futures::StreamExt;
use serde_json::json;
use std::sync::Arc;

const PATH: &str = "/v2/top-headlines/sources";

fn config(server: &Server) -> ClientConfig {
    ClientConfig {
        base_url: format!("{}/v2/", server.url()),
        api_key: "test-key".to_string(),
        user_agent: "news-sources-tests".to_string(),
        cache: CacheConfig::Memory { max_bytes: 1 << 20 },
        ..Default::default()
    }
}

fn sources_body() -> String {
    json!({
        "status": "ok",
        "sources": [
            {"id": "bbc-news", "name": "BBC News", "description": "UK", "url": "https://www.bbc.co.uk/news", "category": "general"},
            {"id": "cnn", "name": "CNN", "description": "US", "url": "https://us.cnn.com"}
        ]
    })
    .to_string()
}

#[tokio::test]
async fn test_sends_auth_headers_and_decodes() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", PATH)
        .match_header("x-api-key", "test-key")
        .match_header("user-agent", "news-sources-tests")
        .match_header("cache-control", "max-age=86400, max-stale=604800")
        .match_header("x-force-refresh", Matcher::Missing)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(sources_body())
        .create_async()
        .await;

    let client = NewsApiClient::new(config(&server)).await.unwrap();
    let response = client.get_sources(false).await.unwrap();

    mock.assert_async().await;
    let body = response.body.unwrap();
    assert_eq!(body.sources.len(), 2);
    assert_eq!(body.sources[1].id, "cnn");
}

#[tokio::test]
async fn test_unauthorized_uses_envelope_message() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", PATH)
        .with_status(401)
        .with_body(r#"{"status":"error","code":"apiKeyInvalid","message":"Your API key is invalid."}"#)
        .create_async()
        .await;

    let client = NewsApiClient::new(config(&server)).await.unwrap();
    match client.get_sources(false).await {
        Err(NewsError::Http(HttpFault::Unauthorized(details))) => {
            assert_eq!(details.message, "Your API key is invalid.");
            assert_eq!(details.method, "GET");
            assert!(details.url.ends_with(PATH));
        }
        other => panic!("unexpected {:?}", other.map(|r| r.status)),
    }
}

#[tokio::test]
async fn test_server_error_keeps_real_code() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", PATH)
        .with_status(503)
        .with_body("upstream down")
        .create_async()
        .await;

    let client = NewsApiClient::new(config(&server)).await.unwrap();
    let err = client.get_sources(false).await.unwrap_err();
    match err {
        NewsError::Http(HttpFault::ServerError { code, details }) => {
            assert_eq!(code, 503);
            assert_eq!(details.message, "Service Unavailable");
            assert_eq!(details.body, "upstream down");
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[tokio::test]
async fn test_origin_no_store_is_cached_anyway() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", PATH)
        .with_status(200)
        .with_header("cache-control", "no-store")
        .with_header("pragma", "no-cache")
        .with_body(sources_body())
        .expect(1)
        .create_async()
        .await;

    let client = NewsApiClient::new(config(&server)).await.unwrap();
    client.get_sources(false).await.unwrap();
    let second = client.get_sources(false).await.unwrap();

    mock.assert_async().await;
    assert_eq!(second.body.unwrap().sources.len(), 2);
}

#[tokio::test]
async fn test_force_refresh_goes_to_network() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", PATH)
        .match_header("x-force-refresh", Matcher::Missing)
        .with_status(200)
        .with_body(sources_body())
        .expect(2)
        .create_async()
        .await;

    let client = NewsApiClient::new(config(&server)).await.unwrap();
    client.get_sources(false).await.unwrap();
    client.get_sources(true).await.unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn test_forced_not_modified_reports_no_change() {
    let mut server = Server::new_async().await;
    let first = server
        .mock("GET", PATH)
        .match_header("if-none-match", Matcher::Missing)
        .with_status(200)
        .with_header("etag", "\"v1\"")
        .with_body(sources_body())
        .create_async()
        .await;
    let revalidate = server
        .mock("GET", PATH)
        .match_header("if-none-match", "\"v1\"")
        .with_status(304)
        .create_async()
        .await;

    let client = NewsApiClient::new(config(&server)).await.unwrap();
    let repository = DefaultNewsSourcesRepository::new(Arc::new(client));

    let items: Vec<_> = repository
        .get_sources(false, CancellationToken::never())
        .collect()
        .await;
    assert!(matches!(items[1], Resource::Success(ref s) if s.len() == 2));

    let items: Vec<_> = repository
        .get_sources(true, CancellationToken::never())
        .collect()
        .await;
    assert_eq!(items, vec![Resource::Loading, Resource::NoChange]);

    first.assert_async().await;
    revalidate.assert_async().await;
}

#[tokio::test]
async fn test_connection_refused_is_no_connectivity() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let config = ClientConfig {
        base_url: format!("http://127.0.0.1:{}/v2/", port),
        api_key: "k".to_string(),
        cache: CacheConfig::Disabled,
        ..Default::default()
    };
    let client = NewsApiClient::new(config).await.unwrap();

    let err = client.get_sources(false).await.unwrap_err();
    assert!(matches!(err, NewsError::Transport(Fault::NoConnectivity(_))));

    let repository = DefaultNewsSourcesRepository::new(Arc::new(client));
    let items: Vec<_> = repository
        .get_sources(false, CancellationToken::never())
        .collect()
        .await;
    assert_eq!(items.len(), 2);
    assert_eq!(items[1].error_kind(), Some(ErrorKind::NoConnectivity));
}

#[tokio::test]
async fn test_disk_cache_survives_new_client() {
    let dir = tempfile::tempdir().unwrap();
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", PATH)
        .with_status(200)
        .with_body(sources_body())
        .expect(1)
        .create_async()
        .await;

    let config = ClientConfig {
        cache: CacheConfig::Disk {
            dir: dir.path().to_path_buf(),
            max_bytes: 1 << 20,
        },
        ..config(&server)
    };

    NewsApiClient::new(config.clone()).await.unwrap().get_sources(false).await.unwrap();
    let again = NewsApiClient::new(config).await.unwrap().get_sources(false).await.unwrap();

    mock.assert_async().await;
    assert_eq!(again.status, 200);
    assert!(again.body.is_some());
}
