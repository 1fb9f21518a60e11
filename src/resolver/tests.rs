use super::*;
use crate::config::WigleConfig;
use mockito::{Matcher, Server};

fn test_client(base_url: String) -> WigleClient {
    WigleClient::new(&WigleConfig {
        api_name: "test-name".to_string(),
        api_token: "test-token".to_string(),
        base_url,
        timeout_seconds: 5,
    })
    .unwrap()
}

fn test_store() -> Arc<LocationStore> {
    Arc::new(LocationStore::open(":memory:").unwrap())
}

fn bssid(s: &str) -> Bssid {
    Bssid::parse(s).unwrap()
}

#[tokio::test]
async fn test_cache_hit_skips_network() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/api/v2/network/search")
        .match_query(Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let store = test_store();
    store
        .insert_if_absent(&CacheEntry::bare(
            bssid("aa:bb:cc:dd:ee:ff"),
            Coordinate::new(48.0, 2.0),
        ))
        .unwrap();

    let resolver = GeoResolver::new(Arc::clone(&store), test_client(server.url()));
    let position = resolver.resolve(&bssid("AA:BB:CC:DD:EE:FF")).await.unwrap();

    assert_eq!(position, Coordinate::new(48.0, 2.0));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_remote_hit_is_cached() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/api/v2/network/search")
        .match_query(Matcher::UrlEncoded(
            "netid".to_string(),
            "AA:BB:CC:DD:EE:FF".to_string(),
        ))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{
                "success": true,
                "resultCount": 1,
                "results": [{"netid": "AA:BB:CC:DD:EE:FF", "trilat": 48.8584, "trilong": 2.2945}]
            }"#,
        )
        .expect(1)
        .create_async()
        .await;

    let store = test_store();
    let resolver = GeoResolver::new(Arc::clone(&store), test_client(server.url()));

    let first = resolver.resolve(&bssid("aa:bb:cc:dd:ee:ff")).await.unwrap();
    assert_eq!(first, Coordinate::new(48.8584, 2.2945));

    // Second call must come from the cache; the mock allows one hit only
    let second = resolver.resolve(&bssid("aa:bb:cc:dd:ee:ff")).await.unwrap();
    assert_eq!(second, first);
    mock.assert_async().await;

    assert_eq!(
        store.lookup(&bssid("aa:bb:cc:dd:ee:ff")).unwrap(),
        Some(Coordinate::new(48.8584, 2.2945))
    );
}

#[tokio::test]
async fn test_empty_results_not_cached() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/api/v2/network/search")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"success": true, "resultCount": 0, "results": []}"#)
        .create_async()
        .await;

    let store = test_store();
    let resolver = GeoResolver::new(Arc::clone(&store), test_client(server.url()));

    let result = resolver.resolve(&bssid("aa:bb:cc:dd:ee:ff")).await;
    assert!(matches!(result, Err(ResolveError::NoLocationData)));

    // Absence is not cached; a later call may succeed once WiGLE learns of it
    assert_eq!(store.lookup(&bssid("aa:bb:cc:dd:ee:ff")).unwrap(), None);
}

#[tokio::test]
async fn test_result_missing_coordinates() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/api/v2/network/search")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"success": true, "resultCount": 1,
                "results": [{"netid": "AA:BB:CC:DD:EE:FF", "trilat": 48.0, "trilong": null}]}"#,
        )
        .create_async()
        .await;

    let store = test_store();
    let resolver = GeoResolver::new(Arc::clone(&store), test_client(server.url()));

    let result = resolver.resolve(&bssid("aa:bb:cc:dd:ee:ff")).await;
    assert!(matches!(result, Err(ResolveError::NoLocationData)));
    assert_eq!(store.lookup(&bssid("aa:bb:cc:dd:ee:ff")).unwrap(), None);
}

#[tokio::test]
async fn test_application_error() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/api/v2/network/search")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"success": false, "message": "too many queries today"}"#)
        .create_async()
        .await;

    let resolver = GeoResolver::new(test_store(), test_client(server.url()));
    let result = resolver.resolve(&bssid("aa:bb:cc:dd:ee:ff")).await;

    match result {
        Err(ResolveError::Application(message)) => {
            assert_eq!(message, "too many queries today");
        }
        other => panic!("expected application error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_http_error_carries_status_and_body() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/api/v2/network/search")
        .match_query(Matcher::Any)
        .with_status(401)
        .with_body("unauthorized")
        .create_async()
        .await;

    let resolver = GeoResolver::new(test_store(), test_client(server.url()));
    let result = resolver.resolve(&bssid("aa:bb:cc:dd:ee:ff")).await;

    match result {
        Err(ResolveError::Http { status, body }) => {
            assert_eq!(status, 401);
            assert_eq!(body, "unauthorized");
        }
        other => panic!("expected HTTP error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_transport_error() {
    // Nothing listens on port 1; the connection is refused
    let resolver = GeoResolver::new(test_store(), test_client("http://127.0.0.1:1".to_string()));
    let result = resolver.resolve(&bssid("aa:bb:cc:dd:ee:ff")).await;

    assert!(matches!(result, Err(ResolveError::Transport(_))));
}
