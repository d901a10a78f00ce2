use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use http_body_util::BodyExt;
use mcstatus_backend::blocklist::{BlockedServers, hash_host};
use mcstatus_backend::query::{
    BedrockStatus, JavaPlayers, JavaStatus, JavaVersion, LegacyJavaStatus, LegacyPlayers,
    QueryError, StatusClient,
};
use mcstatus_backend::resolver::{CacheTtl, DEFAULT_ICON, Resolver};
use mcstatus_backend::text::Formatted;
use mcstatus_backend::{RateLimitConfig, create_app};
use mcstatus_cache::MemoryCache;
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tower::ServiceExt; // for `oneshot` method

/// Upstream stand-in returning canned results; `None` means the query fails
#[derive(Default, Clone)]
struct FakeClient {
    java: Option<JavaStatus>,
    legacy: Option<LegacyJavaStatus>,
    bedrock: Option<BedrockStatus>,
    java_calls: Arc<AtomicUsize>,
}

impl StatusClient for FakeClient {
    async fn java(&self, _host: &str, _port: u16) -> Result<JavaStatus, QueryError> {
        self.java_calls.fetch_add(1, Ordering::SeqCst);
        self.java
            .clone()
            .ok_or_else(|| QueryError::Protocol(anyhow::anyhow!("connection refused")))
    }

    async fn java_legacy(&self, _host: &str, _port: u16) -> Result<LegacyJavaStatus, QueryError> {
        self.legacy.clone().ok_or(QueryError::Timeout)
    }

    async fn bedrock(&self, _host: &str, _port: u16) -> Result<BedrockStatus, QueryError> {
        self.bedrock.clone().ok_or(QueryError::Timeout)
    }
}

fn java_status(favicon: Option<String>) -> JavaStatus {
    JavaStatus {
        version: JavaVersion {
            name: Formatted::from_legacy("Paper 1.21.1"),
            protocol: 767,
        },
        players: JavaPlayers {
            online: 5,
            max: 20,
            sample: None,
        },
        motd: Formatted::from_legacy("§6A Minecraft Server"),
        favicon,
        mod_info: None,
    }
}

/// Helper to create app with default test configuration
fn create_test_app(client: FakeClient, blocked: BlockedServers) -> axum::Router {
    let resolver = Resolver::new(
        MemoryCache::new(),
        client,
        blocked,
        CacheTtl::default(),
    );
    create_app(resolver, Duration::from_secs(30), RateLimitConfig::default())
}

/// Response pieces the tests look at
struct TestResponse {
    status: StatusCode,
    content_type: Option<String>,
    cache_hit: Option<String>,
    time_remaining: Option<u64>,
    body: Vec<u8>,
}

impl TestResponse {
    fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap_or(json!({}))
    }
}

/// Helper to send a GET request and collect the response
async fn get(app: axum::Router, uri: &str) -> TestResponse {
    let request = Request::builder()
        .uri(uri)
        .method("GET")
        // The rate limiter keys on the client IP
        .header("X-Forwarded-For", "203.0.113.7")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    let header_value = |name: &str| {
        response
            .headers()
            .get(name)
            .map(|value| value.to_str().unwrap().to_string())
    };
    let status = response.status();
    let content_type = header_value(header::CONTENT_TYPE.as_str());
    let cache_hit = header_value("x-cache-hit");
    let time_remaining = header_value("x-cache-time-remaining").map(|v| v.parse().unwrap());

    let body = response.into_body().collect().await.unwrap().to_bytes().to_vec();

    TestResponse {
        status,
        content_type,
        cache_hit,
        time_remaining,
        body,
    }
}

// =============================================================================
// HEALTH ENDPOINT TESTS
// =============================================================================

#[tokio::test]
async fn test_health_endpoint_returns_ok() {
    // GIVEN: A running application
    let app = create_test_app(FakeClient::default(), BlockedServers::new());

    // WHEN: Making a GET request to /health
    let response = get(app, "/health").await;

    // THEN: Should return 200 OK
    assert_eq!(response.status, StatusCode::OK);
}

// =============================================================================
// JAVA STATUS TESTS
// =============================================================================

#[tokio::test]
async fn test_java_status_online_without_sample_or_mods() {
    // GIVEN: A server answering the modern query with 5/20 players, no sample, no mods
    let client = FakeClient {
        java: Some(java_status(None)),
        ..Default::default()
    };
    let app = create_test_app(client, BlockedServers::new());

    // WHEN: Requesting its status
    let response = get(app, "/status/java/play.example.com").await;

    // THEN: Lists are empty, counts are passed through, and the result is fresh
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.content_type.as_deref(), Some("application/json"));
    assert_eq!(response.cache_hit.as_deref(), Some("false"));
    assert_eq!(response.time_remaining, None);

    let body = response.json();
    assert_eq!(body["online"], true);
    assert_eq!(body["host"], "play.example.com");
    assert_eq!(body["port"], 25565);
    assert_eq!(body["eula_blocked"], false);
    assert_eq!(body["players"]["online"], 5);
    assert_eq!(body["players"]["max"], 20);
    assert_eq!(body["players"]["list"], json!([]));
    assert_eq!(body["mods"], json!([]));
    assert_eq!(body["icon"], Value::Null);
    assert_eq!(
        body["motd"],
        json!({
            "raw": "§6A Minecraft Server",
            "clean": "A Minecraft Server",
            "html": "<span style=\"color: #ffaa00;\">A Minecraft Server</span>"
        })
    );
    assert_eq!(body["version"]["name_clean"], "Paper 1.21.1");
    assert_eq!(body["version"]["protocol"], 767);
}

#[tokio::test]
async fn test_java_status_second_request_is_cached() {
    // GIVEN: A server that has just been looked up
    let client = FakeClient {
        java: Some(java_status(None)),
        ..Default::default()
    };
    let calls = Arc::clone(&client.java_calls);
    let app = create_test_app(client, BlockedServers::new());
    let first = get(app.clone(), "/status/java/play.example.com:25565").await;

    // WHEN: Looking it up again
    let second = get(app, "/status/java/play.example.com:25565").await;

    // THEN: The cached body comes back byte for byte with its remaining TTL
    assert_eq!(second.status, StatusCode::OK);
    assert_eq!(second.cache_hit.as_deref(), Some("true"));
    assert!(second.time_remaining.unwrap() <= 60);
    assert_eq!(second.body, first.body);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_java_status_legacy_fallback() {
    // GIVEN: A server that only answers the legacy ping, with a version block
    let client = FakeClient {
        legacy: Some(LegacyJavaStatus {
            version: Some(JavaVersion {
                name: Formatted::from_legacy("1.6.4"),
                protocol: 78,
            }),
            players: LegacyPlayers { online: 3, max: 12 },
            motd: Formatted::from_legacy("Old & gold"),
        }),
        ..Default::default()
    };
    let app = create_test_app(client, BlockedServers::new());

    // WHEN: Requesting its status
    let response = get(app, "/status/java/retro.example.com:25570").await;

    // THEN: Version is copied through, icon is null and mods is empty
    let body = response.json();
    assert_eq!(body["online"], true);
    assert_eq!(body["port"], 25570);
    assert_eq!(
        body["version"],
        json!({
            "name_raw": "1.6.4",
            "name_clean": "1.6.4",
            "name_html": "1.6.4",
            "protocol": 78
        })
    );
    assert_eq!(body["icon"], Value::Null);
    assert_eq!(body["mods"], json!([]));
    assert_eq!(body["players"]["list"], json!([]));
    assert_eq!(body["motd"]["html"], "Old &amp; gold");
}

#[tokio::test]
async fn test_java_status_offline_is_base_record_only() {
    // GIVEN: A server answering neither query
    let app = create_test_app(FakeClient::default(), BlockedServers::new());

    // WHEN: Requesting its status
    let response = get(app, "/status/java/gone.example.com").await;

    // THEN: Only the four base fields are present
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.json(),
        json!({
            "online": false,
            "host": "gone.example.com",
            "port": 25565,
            "eula_blocked": false
        })
    );
}

#[tokio::test]
async fn test_eula_blocked_reported_when_offline() {
    // GIVEN: A blocklist covering every subdomain of example.com
    let blocked = BlockedServers::from_hashes([hash_host("*.example.com")]);
    let app = create_test_app(FakeClient::default(), blocked);

    // WHEN: Requesting the status of an unreachable, blocked server
    let response = get(app, "/status/java/mc.example.com").await;

    // THEN: The block is reported regardless of reachability
    let body = response.json();
    assert_eq!(body["online"], false);
    assert_eq!(body["eula_blocked"], true);
}

#[tokio::test]
async fn test_eula_blocked_reported_when_online() {
    // GIVEN: An online server whose exact host is blocked
    let blocked = BlockedServers::from_hashes([hash_host("play.example.com")]);
    let client = FakeClient {
        java: Some(java_status(None)),
        ..Default::default()
    };
    let app = create_test_app(client, blocked);

    // WHEN: Requesting its status
    let response = get(app, "/status/java/play.example.com").await;

    // THEN: It's online and flagged
    let body = response.json();
    assert_eq!(body["online"], true);
    assert_eq!(body["eula_blocked"], true);
}

// =============================================================================
// BEDROCK STATUS TESTS
// =============================================================================

#[tokio::test]
async fn test_bedrock_status_partial_fields() {
    // GIVEN: A Bedrock server reporting only its protocol and player count
    let client = FakeClient {
        bedrock: Some(BedrockStatus {
            protocol_version: Some(712),
            online_players: Some(2),
            edition: Some("MCPE".to_string()),
            ..Default::default()
        }),
        ..Default::default()
    };
    let app = create_test_app(client, BlockedServers::new());

    // WHEN: Requesting its status on the default port
    let response = get(app, "/status/bedrock/pe.example.com").await;

    // THEN: Containers exist with the unknown fields null
    let body = response.json();
    assert_eq!(body["online"], true);
    assert_eq!(body["port"], 19132);
    assert_eq!(body["version"], json!({ "name": null, "protocol": 712 }));
    assert_eq!(body["players"], json!({ "online": 2, "max": null }));
    assert_eq!(body["motd"], Value::Null);
    assert_eq!(body["gamemode"], Value::Null);
    assert_eq!(body["server_id"], Value::Null);
    assert_eq!(body["edition"], "MCPE");
}

#[tokio::test]
async fn test_bedrock_status_offline() {
    // GIVEN: A Bedrock server that doesn't answer
    let app = create_test_app(FakeClient::default(), BlockedServers::new());

    // WHEN: Requesting its status
    let response = get(app, "/status/bedrock/pe.example.com:19133").await;

    // THEN: The bare offline record comes back
    assert_eq!(
        response.json(),
        json!({
            "online": false,
            "host": "pe.example.com",
            "port": 19133,
            "eula_blocked": false
        })
    );
}

// =============================================================================
// ICON TESTS
// =============================================================================

#[tokio::test]
async fn test_icon_is_decoded_png() {
    // GIVEN: A server advertising a PNG favicon
    let png = vec![0x89, b'P', b'N', b'G', 1, 2, 3];
    let favicon = format!("data:image/png;base64,{}", STANDARD.encode(&png));
    let client = FakeClient {
        java: Some(java_status(Some(favicon))),
        ..Default::default()
    };
    let app = create_test_app(client, BlockedServers::new());

    // WHEN: Requesting the icon
    let response = get(app.clone(), "/icon/play.example.com").await;

    // THEN: The decoded bytes are served as PNG
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.content_type.as_deref(), Some("image/png"));
    assert_eq!(response.cache_hit.as_deref(), Some("false"));
    assert_eq!(response.body, png);

    // AND: A second request is served from the cache
    let cached = get(app, "/icon/play.example.com").await;
    assert_eq!(cached.cache_hit.as_deref(), Some("true"));
    assert_eq!(cached.body, png);
}

#[tokio::test]
async fn test_icon_falls_back_to_default() {
    // GIVEN: A server whose favicon isn't a PNG data URI
    let client = FakeClient {
        java: Some(java_status(Some("https://example.com/icon.png".to_string()))),
        ..Default::default()
    };
    let app = create_test_app(client, BlockedServers::new());

    // WHEN: Requesting the icon
    let response = get(app, "/icon/play.example.com").await;

    // THEN: The built-in icon is served without error
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, DEFAULT_ICON);
}

#[tokio::test]
async fn test_icon_for_offline_server_is_default() {
    // GIVEN: A server that doesn't answer
    let app = create_test_app(FakeClient::default(), BlockedServers::new());

    // WHEN: Requesting the icon
    let response = get(app, "/icon/gone.example.com").await;

    // THEN: The built-in icon is served
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, DEFAULT_ICON);
}
