use chrono::Utc;
use configsync_client::settings::{AuthSettings, ReconnectSettings, Settings};
use configsync_client::{Fetcher, KeyStore};
use configsync_core::{CacheEntry, FetchError};
use mockito::Matcher;

fn settings_for(server_url: &str) -> Settings {
    Settings {
        value_url: format!("{}/api/v1/value", server_url),
        stream_url: "ws://127.0.0.1:9/stream".to_string(),
        auth: AuthSettings {
            api_key: Some("test-key".to_string()),
        },
        preload_keys: Vec::new(),
        request_timeout_ms: 5_000,
        keepalive_interval_ms: 30_000,
        reconnect: ReconnectSettings {
            initial_ms: 10,
            max_ms: 100,
            multiplier: 2.0,
            jitter_ms: 0,
        },
    }
}

#[tokio::test]
async fn batch_fetch_writes_all_returned_keys() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/api/v1/value")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("keys[]".into(), "greeting".into()),
            Matcher::UrlEncoded("keys[]".into(), "banner".into()),
        ]))
        .match_header("authorization", "Basic dGVzdC1rZXk6")
        .match_header("x-lib-version", Matcher::Regex("^configsync-rust/".into()))
        .with_status(200)
        .with_body(
            r#"{"data": {"greeting": {"value": "hello", "ttl": 60}, "banner": {"value": "on", "ttl": 120}}}"#,
        )
        .create_async()
        .await;

    let store = KeyStore::new();
    let fetcher = Fetcher::new(&settings_for(&server.url()), store.clone()).expect("fetcher");
    let keys = vec!["greeting".to_string(), "banner".to_string()];
    fetcher.fetch_batch(&keys, false).await.expect("fetch");

    mock.assert_async().await;
    let greeting = store.get("greeting").expect("greeting entry");
    assert_eq!(greeting.value, "hello");
    assert!(greeting.expires_at.is_some());
    assert_eq!(store.get("banner").expect("banner entry").value, "on");
}

#[tokio::test]
async fn second_fetch_of_fresh_key_issues_no_request() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/api/v1/value")
        .match_query(Matcher::UrlEncoded("keys[]".into(), "greeting".into()))
        .with_body(r#"{"data": {"greeting": {"value": "hello", "ttl": 60}}}"#)
        .expect(1)
        .create_async()
        .await;

    let store = KeyStore::new();
    let fetcher = Fetcher::new(&settings_for(&server.url()), store.clone()).expect("fetcher");
    let keys = vec!["greeting".to_string()];

    fetcher.fetch_batch(&keys, true).await.expect("first fetch");
    fetcher.fetch_batch(&keys, true).await.expect("second fetch");

    mock.assert_async().await;
    assert_eq!(store.get("greeting").expect("entry").value, "hello");
}

#[tokio::test]
async fn expired_entries_are_refetched() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/api/v1/value")
        .match_query(Matcher::UrlEncoded("keys[]".into(), "greeting".into()))
        .with_body(r#"{"data": {"greeting": {"value": "fresh", "ttl": 60}}}"#)
        .expect(1)
        .create_async()
        .await;

    let store = KeyStore::new();
    store.set("greeting", CacheEntry::from_pull("stale", -10, Utc::now()));
    let fetcher = Fetcher::new(&settings_for(&server.url()), store.clone()).expect("fetcher");

    let keys = vec!["greeting".to_string()];
    fetcher.fetch_batch(&keys, true).await.expect("fetch");

    mock.assert_async().await;
    assert_eq!(store.get("greeting").expect("entry").value, "fresh");
}

#[tokio::test]
async fn fresh_keys_short_circuit_without_network() {
    // No mock is registered: any request would come back as an error.
    let mut server = mockito::Server::new_async().await;

    let store = KeyStore::new();
    store.set("greeting", CacheEntry::from_pull("hello", 60, Utc::now()));
    let fetcher = Fetcher::new(&settings_for(&server.url()), store.clone()).expect("fetcher");

    let keys = vec!["greeting".to_string()];
    fetcher.fetch_batch(&keys, true).await.expect("no-op fetch");

    assert_eq!(store.get("greeting").expect("entry").value, "hello");
}

#[tokio::test]
async fn non_success_status_maps_to_upstream_error() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/api/v1/value")
        .with_status(500)
        .with_body("boom")
        .create_async()
        .await;

    let store = KeyStore::new();
    store.set("greeting", CacheEntry::from_push("old"));
    let fetcher = Fetcher::new(&settings_for(&server.url()), store.clone()).expect("fetcher");

    let keys = vec!["greeting".to_string()];
    let err = fetcher.fetch_batch(&keys, false).await.expect_err("fails");

    assert!(matches!(
        err,
        FetchError::UpstreamStatus { status: 500, .. }
    ));
    assert_eq!(store.get("greeting").expect("entry").value, "old");
}

#[tokio::test]
async fn malformed_body_leaves_store_untouched() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/api/v1/value")
        .with_status(200)
        .with_body(r#"{"data": "not-a-map"}"#)
        .create_async()
        .await;

    let store = KeyStore::new();
    store.set("greeting", CacheEntry::from_push("old"));
    let fetcher = Fetcher::new(&settings_for(&server.url()), store.clone()).expect("fetcher");

    let keys = vec!["greeting".to_string(), "banner".to_string()];
    let err = fetcher.fetch_batch(&keys, false).await.expect_err("fails");

    assert!(matches!(err, FetchError::Decode { .. }));
    assert_eq!(store.get("greeting").expect("entry").value, "old");
    assert_eq!(store.get("banner"), None);
}

#[tokio::test]
async fn empty_key_set_is_a_noop() {
    let mut server = mockito::Server::new_async().await;

    let store = KeyStore::new();
    let fetcher = Fetcher::new(&settings_for(&server.url()), store.clone()).expect("fetcher");

    fetcher.fetch_batch(&[], false).await.expect("no-op");
    fetcher.fetch_batch(&[], true).await.expect("no-op");
    assert!(store.is_empty());
}
