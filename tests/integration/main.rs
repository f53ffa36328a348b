//! Integration tests for the download gateway.
//!
//! Each test drives the full router against a local mock fabdl server.
//! Run with: cargo test --test integration

use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tower::ServiceExt;

use spotify_dl_gateway::api::{create_router, AppState};
use spotify_dl_gateway::config::Config;
use spotify_dl_gateway::upstream::{FabdlClient, MockReply, MockServer, MockUpstream};

const TRACK_URL: &str = "https://open.spotify.com/track/abc123";

fn test_config(server: &MockServer) -> Config {
    Config {
        upstream_base_url: server.base_url().to_string(),
        upstream_timeout_ms: 2_000,
        upstream_connect_timeout_ms: 500,
        metrics_enabled: false,
        ..Config::default()
    }
}

fn app_for(config: &Config) -> axum::Router {
    let client = FabdlClient::new(config).expect("client builds");
    create_router(AppState::new(client))
}

async fn send(app: axum::Router, method: &str, uri: &str) -> Response {
    app.oneshot(
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap()
}

async fn get_track(config: &Config) -> Response {
    let uri = format!("/?url={}", urlencoding::encode(TRACK_URL));
    send(app_for(config), "GET", &uri).await
}

async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Assert a 400 error envelope carrying `message`.
async fn assert_error(response: Response, message: &str) {
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response.headers()["access-control-allow-origin"], "*");
    assert_eq!(response.headers()["content-type"], "application/json");
    assert!(response.headers().get("cache-control").is_none());

    assert_eq!(
        body_json(response).await,
        json!({
            "status_code": 400,
            "developer": "El Impaciente",
            "telegram_channel": "https://t.me/Apisimpacientes",
            "message": message
        })
    );
}

#[tokio::test]
async fn end_to_end_success() {
    let server = MockUpstream::new().spawn().await.unwrap();
    let config = test_config(&server);

    let response = get_track(&config).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["access-control-allow-origin"], "*");
    assert_eq!(response.headers()["cache-control"], "public, max-age=3600");
    assert_eq!(response.headers()["content-type"], "application/json");

    let body = body_json(response).await;
    assert_eq!(
        body,
        json!({
            "status_code": 200,
            "developer": "El Impaciente",
            "telegram_channel": "https://t.me/Apisimpacientes",
            "result": {
                "title": "Song",
                "artist": "Artist",
                "duration_ms": 210000,
                "download_url": format!("{}/download/xyz.mp3", server.base_url())
            }
        })
    );

    assert_eq!(server.hits().track_info(), 1);
    assert_eq!(server.hits().conversion(), 1);
    assert_eq!(server.hits().last_track_url().as_deref(), Some(TRACK_URL));
    assert_eq!(
        server.hits().last_conversion(),
        Some(("2".to_string(), "1".to_string()))
    );
}

#[tokio::test]
async fn non_get_methods_are_rejected_without_upstream_calls() {
    let server = MockUpstream::new().spawn().await.unwrap();
    let config = test_config(&server);

    for method in ["POST", "PUT", "DELETE", "PATCH", "OPTIONS"] {
        let uri = format!("/?url={}", urlencoding::encode(TRACK_URL));
        let response = send(app_for(&config), method, &uri).await;
        assert_error(response, "Only GET requests are allowed").await;
    }

    assert_eq!(server.hits().total(), 0);
}

#[tokio::test]
async fn missing_or_blank_url_is_rejected() {
    let server = MockUpstream::new().spawn().await.unwrap();
    let config = test_config(&server);

    for uri in ["/", "/?url=", "/?url=%20%20%20", "/?link=x"] {
        let response = send(app_for(&config), "GET", uri).await;
        assert_error(response, "The url parameter is required").await;
    }

    assert_eq!(server.hits().total(), 0);
}

#[tokio::test]
async fn non_spotify_link_is_rejected() {
    let server = MockUpstream::new().spawn().await.unwrap();
    let config = test_config(&server);

    let response = send(app_for(&config), "GET", "/?url=https://example.com").await;

    assert_error(
        response,
        "Invalid Spotify track URL. Please provide a valid Spotify track link",
    )
    .await;
    assert_eq!(server.hits().total(), 0);
}

#[tokio::test]
async fn metadata_failure_status() {
    let server = MockUpstream::new()
        .track_info(MockReply::status(502))
        .spawn()
        .await
        .unwrap();

    let response = get_track(&test_config(&server)).await;

    assert_error(response, "Error getting track information from Spotify").await;
    assert_eq!(server.hits().total(), 1);
}

#[tokio::test]
async fn metadata_missing_ids() {
    let server = MockUpstream::new()
        .track_info(MockReply::json(json!({"result": {"gid": 2, "name": "Song"}})))
        .spawn()
        .await
        .unwrap();

    let response = get_track(&test_config(&server)).await;

    assert_error(response, "Track not found or unavailable").await;
    assert_eq!(server.hits().conversion(), 0);
}

#[tokio::test]
async fn metadata_missing_result() {
    let server = MockUpstream::new()
        .track_info(MockReply::json(json!({"error": "not found"})))
        .spawn()
        .await
        .unwrap();

    let response = get_track(&test_config(&server)).await;

    assert_error(response, "Track not found or unavailable").await;
}

#[tokio::test]
async fn metadata_non_object_result() {
    for body in [json!({"result": false}), json!({"result": "error"})] {
        let server = MockUpstream::new()
            .track_info(MockReply::json(body))
            .spawn()
            .await
            .unwrap();

        let response = get_track(&test_config(&server)).await;

        assert_error(response, "Track not found or unavailable").await;
        assert_eq!(server.hits().conversion(), 0);
    }
}

#[tokio::test]
async fn mistyped_metadata_fields_are_carried() {
    let server = MockUpstream::new()
        .track_info(MockReply::json(json!({
            "result": {
                "id": 1,
                "gid": 2,
                "name": 7,
                "artists": ["A", "B"],
                "duration_ms": 210000.5
            }
        })))
        .spawn()
        .await
        .unwrap();

    let response = get_track(&test_config(&server)).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await["result"],
        json!({
            "artist": ["A", "B"],
            "duration_ms": 210000.5,
            "download_url": format!("{}/download/xyz.mp3", server.base_url())
        })
    );
}

#[tokio::test]
async fn conversion_failure_status() {
    let server = MockUpstream::new()
        .conversion(MockReply::status(500))
        .spawn()
        .await
        .unwrap();

    let response = get_track(&test_config(&server)).await;

    assert_error(response, "Error generating download URL").await;
    assert_eq!(server.hits().total(), 2);
}

#[tokio::test]
async fn conversion_missing_download_url() {
    let server = MockUpstream::new()
        .conversion(MockReply::json(json!({"result": {"download_url": ""}})))
        .spawn()
        .await
        .unwrap();

    let response = get_track(&test_config(&server)).await;

    assert_error(response, "Download URL not available for this track").await;
}

#[tokio::test]
async fn conversion_non_object_result() {
    for body in [json!({"result": false}), json!({"result": "error"})] {
        let server = MockUpstream::new()
            .conversion(MockReply::json(body))
            .spawn()
            .await
            .unwrap();

        let response = get_track(&test_config(&server)).await;

        assert_error(response, "Download URL not available for this track").await;
    }
}

#[tokio::test]
async fn metadata_timeout() {
    let server = MockUpstream::new()
        .track_info(MockReply::status(200).delayed(Duration::from_millis(800)))
        .spawn()
        .await
        .unwrap();
    let config = Config {
        upstream_timeout_ms: 150,
        upstream_connect_timeout_ms: 100,
        ..test_config(&server)
    };

    let response = get_track(&config).await;

    assert_error(response, "Request timeout. Please try again").await;
}

#[tokio::test]
async fn conversion_timeout() {
    let server = MockUpstream::new()
        .conversion(MockReply::status(200).delayed(Duration::from_millis(800)))
        .spawn()
        .await
        .unwrap();
    let config = Config {
        upstream_timeout_ms: 150,
        upstream_connect_timeout_ms: 100,
        ..test_config(&server)
    };

    let response = get_track(&config).await;

    assert_error(response, "Request timeout. Please try again").await;
    assert_eq!(server.hits().track_info(), 1);
}

#[tokio::test]
async fn malformed_upstream_body_is_generic_error() {
    let server = MockUpstream::new()
        .conversion(MockReply::raw("not json"))
        .spawn()
        .await
        .unwrap();

    let response = get_track(&test_config(&server)).await;

    assert_error(response, "Error processing the request. Please try again").await;
}

#[tokio::test]
async fn string_identifiers_are_forwarded_in_path() {
    let server = MockUpstream::new()
        .track_info(MockReply::json(json!({
            "result": {
                "id": "4uLU6hMCjMI75M1A2tKUQC",
                "gid": "1000293",
                "name": "Never Gonna Give You Up",
                "artists": "Rick Astley",
                "duration_ms": 213573
            }
        })))
        .spawn()
        .await
        .unwrap();

    let response = get_track(&test_config(&server)).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status_code"], 200);
    assert_eq!(body["result"]["artist"], "Rick Astley");
    assert_eq!(
        server.hits().last_conversion(),
        Some(("1000293".to_string(), "4uLU6hMCjMI75M1A2tKUQC".to_string()))
    );
}

#[tokio::test]
async fn non_get_on_health_is_rejected_with_envelope() {
    let server = MockUpstream::new().spawn().await.unwrap();
    let config = test_config(&server);

    let response = send(app_for(&config), "POST", "/health").await;

    assert_error(response, "Only GET requests are allowed").await;
    assert_eq!(server.hits().total(), 0);
}

#[tokio::test]
async fn status_code_field_matches_http_status() {
    let server = MockUpstream::new().spawn().await.unwrap();
    let config = test_config(&server);

    let success = get_track(&config).await;
    let success_status = success.status().as_u16();
    assert_eq!(body_json(success).await["status_code"], success_status);

    let failure = send(app_for(&config), "GET", "/?url=nope").await;
    let failure_status = failure.status().as_u16();
    assert_eq!(body_json(failure).await["status_code"], failure_status);
}

#[tokio::test]
async fn concurrent_requests_do_not_interfere() {
    let server = MockUpstream::new().spawn().await.unwrap();
    let config = test_config(&server);
    let app = app_for(&config);

    let ok_uri = format!("/?url={}", urlencoding::encode(TRACK_URL));
    let (ok, bad) = tokio::join!(
        send(app.clone(), "GET", &ok_uri),
        send(app, "GET", "/?url=https://example.com"),
    );

    assert_eq!(ok.status(), StatusCode::OK);
    assert_eq!(bad.status(), StatusCode::BAD_REQUEST);
    assert_eq!(server.hits().total(), 2);
}

#[test]
fn default_config_targets_fabdl() {
    let config = Config::default();
    tokio_test::assert_ok!(config.validate());
    assert_eq!(config.upstream_base_url, "https://api.fabdl.com");
}
