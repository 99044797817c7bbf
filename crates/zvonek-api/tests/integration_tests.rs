//! # Integration Tests for zvonek-api
//!
//! Drives the assembled router with `tower::ServiceExt::oneshot`: lock
//! actuation and the capability gate, doorbell ring and its rate limit,
//! camera stream, pairing accessors, the loopback accessory hook, metrics,
//! health probes, and the OpenAPI document.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::extract::connect_info::MockConnectInfo;
use axum::extract::ConnectInfo;
use axum::http::{Request, StatusCode};
use futures::{SinkExt, StreamExt};
use http_body_util::BodyExt;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tower::ServiceExt;

use zvonek_api::state::{AppConfig, AppState, DEV_SECRET};
use zvonek_core::{CapabilityGate, Claims, DoorEvent, HubMessage, SigningSecret};
use zvonek_hub::{CameraError, EncodedFrame, FrameSource};

const TINY_JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0xFF, 0xD9];

struct FakeCamera;

impl FrameSource for FakeCamera {
    fn capture(&self) -> Result<EncodedFrame, CameraError> {
        EncodedFrame::jpeg(TINY_JPEG)
    }
}

/// Helper: build the test app from a state, as if served from `peer`.
fn router(state: AppState, peer: [u8; 4]) -> axum::Router {
    zvonek_api::app(state).layer(MockConnectInfo(SocketAddr::from((peer, 40000))))
}

/// Helper: build the test app with defaults, served to a loopback peer.
fn test_app() -> (axum::Router, AppState) {
    let state = AppState::new();
    (router(state.clone(), [127, 0, 0, 1]), state)
}

fn bearer(secret: &str, ttl: chrono::Duration) -> String {
    let gate = CapabilityGate::new(&SigningSecret::new(secret));
    let token = gate
        .issue(&Claims::expiring_in(ttl).with_subject("7").with_surname("Novak"))
        .unwrap();
    format!("Bearer {token}")
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn get_with_auth(uri: &str, authorization: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("authorization", authorization)
        .body(Body::empty())
        .unwrap()
}

fn post(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn put_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("PUT")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Helper: read response body as string.
async fn body_string(response: axum::http::Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn body_json(response: axum::http::Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// -- Health Probes ------------------------------------------------------------

#[tokio::test]
async fn test_liveness_probe() {
    let (app, _) = test_app();
    let response = app.oneshot(get("/health/liveness")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ok");
}

#[tokio::test]
async fn test_readiness_probe() {
    let (app, _) = test_app();
    let response = app.oneshot(get("/health/readiness")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ready");
}

// -- Lock Actuation -----------------------------------------------------------

#[tokio::test]
async fn test_open_door_with_valid_token() {
    let (app, state) = test_app();
    let mut observer = state.broadcaster.attach();

    let response = app
        .oneshot(get_with_auth(
            "/api/open-door",
            &bearer(DEV_SECRET, chrono::Duration::hours(2)),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "success");
    assert_eq!(body["message"], "Door opened");
    assert_eq!(body["snapshot"]["locked"], false);
    assert_eq!(body["snapshot"]["door_open"], true);
    assert_eq!(body["snapshot"]["homekit_connected"], true);

    assert!(state.store.read().door_open());
    assert_eq!(
        observer.try_recv_queued(),
        Some(HubMessage::Event(DoorEvent::LockStateChanged {
            state: zvonek_core::LockState::Unlocked,
            homekit_connected: true,
        }))
    );
}

#[tokio::test]
async fn test_lock_door_after_open() {
    let (app, state) = test_app();
    let auth = bearer(DEV_SECRET, chrono::Duration::hours(2));

    app.clone()
        .oneshot(get_with_auth("/api/open-door", &auth))
        .await
        .unwrap();
    let response = app
        .oneshot(get_with_auth("/api/lock-door", &auth))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Door locked");
    assert!(state.store.read().locked());
}

#[tokio::test]
async fn test_open_door_without_token_is_rejected() {
    let (app, state) = test_app();
    let mut observer = state.broadcaster.attach();

    let response = app.oneshot(get("/api/open-door")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["status"], "error");
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("missing authorization header"));

    assert!(state.store.read().locked());
    assert!(observer.try_recv_queued().is_none());
}

#[tokio::test]
async fn test_rejected_credentials_leave_state_untouched() {
    let (app, state) = test_app();
    let cases = [
        "Basic dXNlcjpwYXNz".to_string(),
        "Bearer ".to_string(),
        "Bearer not.a.jwt".to_string(),
        bearer("some-other-secret", chrono::Duration::hours(2)),
        bearer(DEV_SECRET, chrono::Duration::hours(-2)),
    ];
    for auth in cases {
        let response = app
            .clone()
            .oneshot(get_with_auth("/api/open-door", &auth))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "accepted {auth}");
    }
    assert!(state.store.read().locked());
}

#[tokio::test]
async fn test_configured_secret_replaces_dev_secret() {
    let config = AppConfig::from_lookup(|var| {
        (var == "ZVONEK_JWT_SECRET").then(|| "deployment-secret".to_string())
    })
    .unwrap();
    let app = router(AppState::with_config(config, None), [127, 0, 0, 1]);

    let dev = app
        .clone()
        .oneshot(get_with_auth(
            "/api/open-door",
            &bearer(DEV_SECRET, chrono::Duration::hours(2)),
        ))
        .await
        .unwrap();
    assert_eq!(dev.status(), StatusCode::UNAUTHORIZED);

    let configured = app
        .oneshot(get_with_auth(
            "/api/open-door",
            &bearer("deployment-secret", chrono::Duration::hours(2)),
        ))
        .await
        .unwrap();
    assert_eq!(configured.status(), StatusCode::OK);
}

// -- Doorbell -----------------------------------------------------------------

#[tokio::test]
async fn test_ring_is_public_and_broadcast() {
    let (app, state) = test_app();
    let mut first = state.broadcaster.attach();
    let mut second = state.broadcaster.attach();

    let response = app.oneshot(post("/api/ring")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "success");
    assert_eq!(body["message"], "Doorbell event sent");
    assert_eq!(body["snapshot"]["locked"], true);

    for observer in [&mut first, &mut second] {
        assert_eq!(
            observer.try_recv_queued(),
            Some(HubMessage::Event(DoorEvent::DoorbellRang))
        );
    }
}

/// Helper: a ring from `peer`, optionally claiming to be forwarded for someone.
fn ring_from(peer: [u8; 4], forwarded_for: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("POST").uri("/api/ring");
    if let Some(client) = forwarded_for {
        builder = builder.header("x-forwarded-for", client);
    }
    let mut request = builder.body(Body::empty()).unwrap();
    request
        .extensions_mut()
        .insert(ConnectInfo(SocketAddr::from((peer, 40000))));
    request
}

#[tokio::test]
async fn test_ring_is_rate_limited_per_peer() {
    let config = AppConfig {
        ring_rate_limit: 2,
        ..AppConfig::default()
    };
    let app = zvonek_api::app(AppState::with_config(config, None));
    let visitor = [198, 51, 100, 1];

    for _ in 0..2 {
        let response = app.clone().oneshot(ring_from(visitor, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
    let limited = app.clone().oneshot(ring_from(visitor, None)).await.unwrap();
    assert_eq!(limited.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body_json(limited).await["error"]["code"], "RATE_LIMITED");

    // A forged forwarding header does not buy a fresh bucket.
    for i in 0..10 {
        let forged = format!("10.0.0.{i}");
        let response = app
            .clone()
            .oneshot(ring_from(visitor, Some(&forged)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    // Another visitor is unaffected.
    let other = app.oneshot(ring_from([198, 51, 100, 2], None)).await.unwrap();
    assert_eq!(other.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_rate_limit_does_not_apply_to_actuation() {
    let config = AppConfig {
        ring_rate_limit: 1,
        ..AppConfig::default()
    };
    let app = router(AppState::with_config(config, None), [127, 0, 0, 1]);
    let auth = bearer(DEV_SECRET, chrono::Duration::hours(2));
    for _ in 0..3 {
        let response = app
            .clone()
            .oneshot(get_with_auth("/api/lock-door", &auth))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}

// -- Status Socket --------------------------------------------------------------

#[tokio::test]
async fn test_status_socket_requires_upgrade() {
    let (app, state) = test_app();
    let response = app.oneshot(get("/ws/status")).await.unwrap();
    assert!(response.status().is_client_error());
    assert_eq!(state.broadcaster.subscriber_count(), 0);
}

type StatusClient =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// Helper: serve the full app on an ephemeral loopback port.
async fn serve(state: AppState) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = zvonek_api::app(state);
    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });
    addr
}

/// Helper: next frame from the status socket, within a deadline.
async fn next_frame(client: &mut StatusClient) -> WsMessage {
    tokio::time::timeout(Duration::from_secs(5), client.next())
        .await
        .expect("no frame before deadline")
        .expect("socket ended")
        .unwrap()
}

/// Helper: next text frame that carries an `event` field, skipping status ticks.
async fn next_event(client: &mut StatusClient) -> serde_json::Value {
    loop {
        if let WsMessage::Text(text) = next_frame(client).await {
            let value: serde_json::Value = serde_json::from_str(&text).unwrap();
            if value.get("event").is_some() {
                return value;
            }
        }
    }
}

#[tokio::test]
async fn test_status_socket_relays_status_and_events() {
    let state = AppState::new();
    let addr = serve(state.clone()).await;
    let (mut client, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/ws/status"))
        .await
        .unwrap();

    match next_frame(&mut client).await {
        WsMessage::Text(text) => {
            let value: serde_json::Value = serde_json::from_str(&text).unwrap();
            assert_eq!(
                value,
                serde_json::json!({"homekit_connected": false, "locked": true, "door_open": false})
            );
        }
        other => panic!("expected status text frame, got {other:?}"),
    }
    assert_eq!(state.broadcaster.subscriber_count(), 1);

    let http = router(state.clone(), [127, 0, 0, 1]);
    let response = http.clone().oneshot(post("/api/ring")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        next_event(&mut client).await,
        serde_json::json!({"event": "doorbell"})
    );

    let response = http
        .oneshot(get_with_auth(
            "/api/open-door",
            &bearer(DEV_SECRET, chrono::Duration::hours(2)),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        next_event(&mut client).await,
        serde_json::json!({
            "event": "lock_state_changed",
            "state": "unlocked",
            "homekit_connected": true,
            "locked": false,
            "door_open": true,
        })
    );
}

#[tokio::test]
async fn test_status_socket_answers_ping() {
    let state = AppState::new();
    let addr = serve(state).await;
    let (mut client, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/ws/status"))
        .await
        .unwrap();

    client
        .send(WsMessage::Ping(b"knock".to_vec()))
        .await
        .unwrap();
    loop {
        match next_frame(&mut client).await {
            WsMessage::Pong(data) => {
                assert_eq!(data, b"knock".to_vec());
                break;
            }
            WsMessage::Text(_) => continue,
            other => panic!("unexpected frame {other:?}"),
        }
    }
}

#[tokio::test]
async fn test_status_socket_detaches_dropped_peer() {
    let state = AppState::new();
    let addr = serve(state.clone()).await;
    let (mut client, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/ws/status"))
        .await
        .unwrap();
    next_frame(&mut client).await;
    assert_eq!(state.broadcaster.subscriber_count(), 1);

    drop(client);

    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while state.broadcaster.subscriber_count() > 0 {
        assert!(
            tokio::time::Instant::now() < deadline,
            "subscriber still attached after peer dropped"
        );
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    // Events published after the peer left go nowhere and do not fail.
    let report = state.broadcaster.publish(DoorEvent::DoorbellRang);
    assert_eq!(report.delivered, 0);
}

// -- Camera ---------------------------------------------------------------------

#[tokio::test]
async fn test_camera_stream_without_camera() {
    let (app, _) = test_app();
    let response = app.oneshot(get("/api/camera-stream")).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["error"]["message"], "Camera not initialized");
}

#[tokio::test]
async fn test_camera_stream_yields_multipart_jpeg() {
    let config = AppConfig {
        frame_interval: std::time::Duration::from_millis(1),
        ..AppConfig::default()
    };
    let state = AppState::with_config(config, Some(Arc::new(FakeCamera)));
    let app = router(state.clone(), [127, 0, 0, 1]);

    let response = app.oneshot(get("/api/camera-stream")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"],
        "multipart/x-mixed-replace; boundary=frame"
    );

    let mut body = response.into_body();
    let part = body
        .frame()
        .await
        .unwrap()
        .unwrap()
        .into_data()
        .unwrap();
    let head = b"--frame\r\nContent-Type: image/jpeg\r\n\r\n";
    assert!(part.starts_with(head));
    assert_eq!(&part[head.len()..head.len() + TINY_JPEG.len()], TINY_JPEG);
    assert!(state.frames.as_ref().unwrap().is_active());
}

// -- Pairing Accessors ------------------------------------------------------------

fn pairing_app(dir: &tempfile::TempDir, pincode: Option<&str>) -> axum::Router {
    let config = AppConfig {
        qr_path: dir.path().join("homekit_qr.png"),
        accessory_state_path: dir.path().join("accessory.state"),
        homekit_pincode: pincode.map(str::to_string),
        homekit_setup_id: pincode.map(|_| "7OSX".to_string()),
        ..AppConfig::default()
    };
    router(AppState::with_config(config, None), [127, 0, 0, 1])
}

#[tokio::test]
async fn test_homekit_code_before_and_after_publish() {
    let dir = tempfile::tempdir().unwrap();

    let response = pairing_app(&dir, None)
        .oneshot(get("/api/homekit-code"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        serde_json::json!({"error": "HomeKit Code not generated yet"})
    );

    let response = pairing_app(&dir, Some("031-45-154"))
        .oneshot(get("/api/homekit-code"))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["pincode"], "031-45-154");
    assert_eq!(body["setup_uri"], "X-HM://7OSX03145154");
}

#[tokio::test]
async fn test_homekit_qr_served_once_rendered() {
    let dir = tempfile::tempdir().unwrap();
    let app = pairing_app(&dir, None);

    let response = app.clone().oneshot(get("/api/homekit-qr")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        serde_json::json!({"error": "QR Code not generated yet"})
    );

    let png = b"\x89PNG\r\n\x1a\nfake";
    std::fs::write(dir.path().join("homekit_qr.png"), png).unwrap();
    let response = app.oneshot(get("/api/homekit-qr")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "image/png");
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], png);
}

#[tokio::test]
async fn test_homekit_status_tracks_accessory_state_file() {
    let dir = tempfile::tempdir().unwrap();
    let app = pairing_app(&dir, None);

    let response = app.clone().oneshot(get("/api/homekit-status")).await.unwrap();
    assert_eq!(body_json(response).await["homekit_connected"], false);

    std::fs::write(dir.path().join("accessory.state"), b"{}").unwrap();
    let response = app.oneshot(get("/api/homekit-status")).await.unwrap();
    assert_eq!(body_json(response).await["homekit_connected"], true);
}

// -- Accessory Hook -------------------------------------------------------------

#[tokio::test]
async fn test_accessory_write_unlocks_and_marks_connected() {
    let (app, state) = test_app();
    let mut observer = state.broadcaster.attach();

    let response = app
        .clone()
        .oneshot(put_json(
            "/internal/accessory/lock",
            serde_json::json!({"value": 0}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["value"], 0);
    assert_eq!(body["snapshot"]["homekit_connected"], true);
    assert_eq!(body["snapshot"]["door_open"], true);
    assert!(matches!(
        observer.try_recv_queued(),
        Some(HubMessage::Event(DoorEvent::LockStateChanged { .. }))
    ));

    let response = app.oneshot(get("/internal/accessory/lock")).await.unwrap();
    assert_eq!(body_json(response).await["value"], 0);
}

#[tokio::test]
async fn test_accessory_hook_rejects_remote_peers() {
    let state = AppState::new();
    let app = router(state.clone(), [192, 0, 2, 10]);
    let response = app
        .oneshot(put_json(
            "/internal/accessory/lock",
            serde_json::json!({"value": 0}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(state.store.read().locked());
    assert!(!state.store.read().homekit_connected());
}

#[tokio::test]
async fn test_accessory_hook_validates_value() {
    let (app, state) = test_app();
    let response = app
        .clone()
        .oneshot(put_json(
            "/internal/accessory/lock",
            serde_json::json!({"value": 5}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(put_json(
            "/internal/accessory/lock",
            serde_json::json!({"locked": true}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(!state.store.read().homekit_connected());
}

// -- Metrics & OpenAPI ------------------------------------------------------------

#[tokio::test]
async fn test_metrics_counts_requests() {
    let (app, state) = test_app();
    let _observer = state.broadcaster.attach();

    app.clone().oneshot(post("/api/ring")).await.unwrap();
    app.clone().oneshot(get("/api/open-door")).await.unwrap();

    let response = app.oneshot(get("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["requests"], 2);
    assert_eq!(body["errors"], 1);
    assert_eq!(body["unauthorized"], 1);
    assert_eq!(body["rate_limited"], 0);
    assert_eq!(body["subscribers"], 1);
    assert_eq!(body["camera_active"], false);
}

#[tokio::test]
async fn test_metrics_can_be_disabled() {
    let config = AppConfig {
        metrics_enabled: false,
        ..AppConfig::default()
    };
    let app = router(AppState::with_config(config, None), [127, 0, 0, 1]);
    let response = app.oneshot(get("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_openapi_spec_served() {
    let (app, _) = test_app();
    let response = app.oneshot(get("/openapi.json")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["paths"]["/api/open-door"].is_object());
    assert!(body["paths"]["/api/ring"].is_object());
}

#[tokio::test]
async fn test_cors_allows_any_origin() {
    let (app, _) = test_app();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/homekit-status")
                .header("origin", "http://panel.local")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.headers()["access-control-allow-origin"], "*");
}
