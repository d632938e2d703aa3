use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

use handshake_api::create_app;
use handshake_config::AppConfig;
use handshake_dispatcher::DispatchCoordinator;
use handshake_testing_utils::{
    DispatchPayloadBuilder, NotifyBehavior, RecordingCallbackSink, ScriptedNotifier,
};

fn setup(
    notifier: &ScriptedNotifier,
    sink: &RecordingCallbackSink,
) -> (Router, DispatchCoordinator) {
    let coordinator = DispatchCoordinator::new(
        &AppConfig::default(),
        Arc::new(notifier.clone()),
        Arc::new(sink.clone()),
    );
    (create_app(coordinator.clone()), coordinator)
}

fn json_request(body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .unwrap()
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

#[tokio::test(start_paused = true)]
async fn test_valid_dispatch_is_acknowledged_with_empty_body() {
    let notifier = ScriptedNotifier::new().with_default(NotifyBehavior::Hang);
    let sink = RecordingCallbackSink::new();
    let (app, coordinator) = setup(&notifier, &sink);

    let body = DispatchPayloadBuilder::new()
        .with_player("https://p1", "alice")
        .with_player("https://p2", "bob")
        .to_json()
        .to_string();
    let response = app.oneshot(json_request(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_bytes(response).await.is_empty());

    // 应答时分发仍在进行
    assert_eq!(coordinator.in_flight(), 1);
    assert!(sink.attempts().is_empty());

    sink.wait_for_delivery().await;
    let delivery = &sink.deliveries()[0];
    assert_eq!(delivery.url, "https://orch/api/game/g1/finish/");
    assert_eq!(delivery.payload.players.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_missing_fields_are_rejected_with_empty_body() {
    let notifier = ScriptedNotifier::new();
    let sink = RecordingCallbackSink::new();
    let (app, coordinator) = setup(&notifier, &sink);

    let bodies = vec![
        json!({
            "players": [{"server_url": "https://p1", "username": "alice"}],
            "callback_url": "https://orch"
        }),
        json!({"players": [{"server_url": "https://p1", "username": "alice"}], "game_id": "g1"}),
        json!({"game_id": "g1", "callback_url": "https://orch", "secret": "s"}),
        json!({"players": [], "game_id": "g1", "callback_url": "https://orch"}),
        json!({
            "players": [{"server_url": "https://p1", "username": "alice"}],
            "game_id": "",
            "callback_url": "https://orch"
        }),
        json!({}),
    ];

    for body in bodies {
        let response = app
            .clone()
            .oneshot(json_request(body.to_string()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {body}");
        assert!(body_bytes(response).await.is_empty());
    }

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(notifier.call_count(), 0);
    assert!(sink.attempts().is_empty());
    assert_eq!(coordinator.in_flight(), 0);
}

#[tokio::test]
async fn test_malformed_body_is_rejected() {
    let notifier = ScriptedNotifier::new();
    let sink = RecordingCallbackSink::new();
    let (app, _) = setup(&notifier, &sink);

    let response = app
        .clone()
        .oneshot(json_request("not json".to_string()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_bytes(response).await.is_empty());

    let response = app
        .clone()
        .oneshot(json_request(r#"{"players": "alice", "game_id": "g1"}"#.to_string()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let request = Request::builder()
        .method("POST")
        .uri("/")
        .body(Body::from(
            DispatchPayloadBuilder::new()
                .with_player("https://p1", "alice")
                .to_json()
                .to_string(),
        ))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    assert_eq!(notifier.call_count(), 0);
}

#[tokio::test]
async fn test_health_check_reports_in_flight() {
    let notifier = ScriptedNotifier::new().with_default(NotifyBehavior::Hang);
    let sink = RecordingCallbackSink::new();
    let (app, _) = setup(&notifier, &sink);

    let response = app
        .clone()
        .oneshot(
            json_request(
                DispatchPayloadBuilder::new()
                    .with_player("https://p1", "alice")
                    .to_json()
                    .to_string(),
            ),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "handshake");
    assert_eq!(body["in_flight"], 1);
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let (app, _) = setup(&ScriptedNotifier::new(), &RecordingCallbackSink::new());

    let request = Request::builder()
        .method("POST")
        .uri("/api/unknown")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
