//! Full HTTP round trips against stub participants and a stub orchestrator.
//! The notification deadline is shortened to one second to keep these fast.

use axum::http::StatusCode;
use std::time::Duration;
use tokio::net::TcpListener;

use handshake_api::create_app;
use handshake_config::AppConfig;
use handshake_dispatcher::{CallbackRetryPolicy, DispatchCoordinator};
use handshake_domain::{NotificationPayload, PlayerResult, PlayerState};
use handshake_testing_utils::{
    DispatchPayloadBuilder, NotifyBehavior, StubOrchestrator, StubParticipant,
};

fn short_deadline_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.dispatch.notify_timeout_seconds = 1;
    config
}

fn http_coordinator() -> DispatchCoordinator {
    DispatchCoordinator::with_http(&short_deadline_config()).unwrap()
}

async fn spawn_service(coordinator: DispatchCoordinator) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, create_app(coordinator)).await.unwrap();
    });
    format!("http://{addr}/")
}

fn fast_retry(max_attempts: u32) -> CallbackRetryPolicy {
    CallbackRetryPolicy {
        max_attempts,
        base_delay: Duration::from_millis(10),
        max_delay: Duration::from_millis(50),
        backoff_multiplier: 2.0,
        jitter_factor: 0.0,
    }
}

#[tokio::test]
async fn test_one_finished_one_dnf() {
    let alice =
        StubParticipant::spawn(NotifyBehavior::RespondAfter(Duration::from_millis(50))).await;
    let bob = StubParticipant::spawn(NotifyBehavior::Hang).await;
    let orchestrator = StubOrchestrator::spawn().await;

    let service = spawn_service(http_coordinator()).await;

    let body = DispatchPayloadBuilder::new()
        .with_player(&alice.endpoint(), "alice")
        .with_player(&bob.endpoint(), "bob")
        .with_callback_url(&orchestrator.base_url())
        .with_secret(Some("s"))
        .to_json();

    let response = reqwest::Client::new()
        .post(&service)
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    assert!(response.text().await.unwrap().is_empty());

    let (path, payload) = orchestrator
        .next_callback(Duration::from_secs(5))
        .await
        .expect("callback should arrive after the deadline");

    assert_eq!(path, "/api/game/g1/finish/");
    assert_eq!(
        payload.players,
        vec![
            PlayerResult {
                username: "alice".to_string(),
                state: PlayerState::Finished,
            },
            PlayerResult {
                username: "bob".to_string(),
                state: PlayerState::Dnf,
            },
        ]
    );
    assert_eq!(payload.secret.as_deref(), Some("s"));

    let expected = NotificationPayload {
        game_id: "g1".to_string(),
        url: orchestrator.base_url(),
    };
    assert_eq!(alice.received(), vec![expected.clone()]);
    assert_eq!(bob.received(), vec![expected]);
}

#[tokio::test]
async fn test_unreachable_and_failing_participants_are_dnf() {
    let failing = StubParticipant::spawn(NotifyBehavior::FailAfter(Duration::ZERO)).await;
    let orchestrator = StubOrchestrator::spawn().await;

    let service = spawn_service(http_coordinator()).await;

    let body = DispatchPayloadBuilder::new()
        .with_player(&failing.endpoint(), "failing")
        .with_player("http://127.0.0.1:1/", "unreachable")
        .with_callback_url(&orchestrator.base_url())
        .to_json();

    let response = reqwest::Client::new()
        .post(&service)
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let (_, payload) = orchestrator
        .next_callback(Duration::from_secs(5))
        .await
        .expect("callback should arrive");
    assert!(payload.players.iter().all(|p| p.state == PlayerState::Dnf));
    assert_eq!(payload.players.len(), 2);
}

#[tokio::test]
async fn test_invalid_request_over_http() {
    let orchestrator = StubOrchestrator::spawn().await;
    let service = spawn_service(http_coordinator()).await;

    let body = DispatchPayloadBuilder::new()
        .with_player("http://127.0.0.1:1/", "alice")
        .with_callback_url(&orchestrator.base_url())
        .without_game_id()
        .to_json();

    let response = reqwest::Client::new()
        .post(&service)
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
    assert!(response.text().await.unwrap().is_empty());

    assert!(orchestrator
        .next_callback(Duration::from_millis(1500))
        .await
        .is_none());
}

#[tokio::test]
async fn test_rejected_callback_is_not_retried() {
    let alice = StubParticipant::spawn(NotifyBehavior::RespondAfter(Duration::ZERO)).await;
    let orchestrator = StubOrchestrator::spawn_with_status(StatusCode::UNAUTHORIZED).await;

    let coordinator = http_coordinator().with_retry_policy(fast_retry(3));
    let handle = coordinator
        .submit(
            DispatchPayloadBuilder::new()
                .with_player(&alice.endpoint(), "alice")
                .with_callback_url(&orchestrator.base_url())
                .build(),
        )
        .unwrap();
    handle.wait().await.unwrap();

    assert!(orchestrator
        .next_callback(Duration::from_secs(1))
        .await
        .is_some());
    assert!(orchestrator
        .next_callback(Duration::from_millis(200))
        .await
        .is_none());
}

#[tokio::test]
async fn test_server_error_callback_is_retried() {
    let alice = StubParticipant::spawn(NotifyBehavior::RespondAfter(Duration::ZERO)).await;
    let orchestrator =
        StubOrchestrator::spawn_with_status(StatusCode::SERVICE_UNAVAILABLE).await;

    let coordinator = http_coordinator().with_retry_policy(fast_retry(3));
    let handle = coordinator
        .submit(
            DispatchPayloadBuilder::new()
                .with_player(&alice.endpoint(), "alice")
                .with_callback_url(&orchestrator.base_url())
                .build(),
        )
        .unwrap();
    handle.wait().await.unwrap();

    for _ in 0..3 {
        assert!(orchestrator
            .next_callback(Duration::from_secs(1))
            .await
            .is_some());
    }
    assert!(orchestrator
        .next_callback(Duration::from_millis(200))
        .await
        .is_none());
}
