use std::sync::Arc;
use std::time::Duration;

use handshake_config::AppConfig;
use handshake_dispatcher::{CallbackRetryPolicy, DispatchCoordinator};
use handshake_testing_utils::{
    CallbackFailure, DispatchPayloadBuilder, RecordingCallbackSink, ScriptedNotifier,
};

fn policy(max_attempts: u32) -> CallbackRetryPolicy {
    CallbackRetryPolicy {
        max_attempts,
        base_delay: Duration::from_millis(100),
        max_delay: Duration::from_secs(5),
        backoff_multiplier: 2.0,
        jitter_factor: 0.0,
    }
}

fn coordinator(
    sink: &RecordingCallbackSink,
    retry_policy: CallbackRetryPolicy,
) -> DispatchCoordinator {
    DispatchCoordinator::new(
        &AppConfig::default(),
        Arc::new(ScriptedNotifier::new()),
        Arc::new(sink.clone()),
    )
    .with_retry_policy(retry_policy)
}

fn request() -> handshake_domain::DispatchRequest {
    DispatchPayloadBuilder::new()
        .with_player("https://p1", "alice")
        .build_request()
}

#[tokio::test(start_paused = true)]
async fn test_transient_failures_are_retried_with_backoff() {
    let sink = RecordingCallbackSink::failing_with(vec![
        CallbackFailure::Network,
        CallbackFailure::ServerError,
    ]);
    let coordinator = coordinator(&sink, policy(3));

    coordinator.run(request()).await;

    let attempts = sink.attempts();
    assert_eq!(attempts.len(), 3);
    assert!(!attempts[0].succeeded);
    assert!(!attempts[1].succeeded);
    assert!(attempts[2].succeeded);

    let first_gap = attempts[1].at.duration_since(attempts[0].at);
    let second_gap = attempts[2].at.duration_since(attempts[1].at);
    assert!(first_gap >= Duration::from_millis(100) && first_gap < Duration::from_millis(150));
    assert!(second_gap >= Duration::from_millis(200) && second_gap < Duration::from_millis(250));
    assert!(attempts.iter().all(|a| a.payload == attempts[0].payload));
}

#[tokio::test(start_paused = true)]
async fn test_rejected_callback_is_not_retried() {
    let sink = RecordingCallbackSink::failing_with(vec![CallbackFailure::Rejected(401)]);
    let coordinator = coordinator(&sink, policy(5));

    let result = coordinator.run(request()).await;

    assert_eq!(sink.attempts().len(), 1);
    assert!(sink.deliveries().is_empty());
    assert_eq!(result.completed_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_single_attempt_policy_gives_up_silently() {
    let sink = RecordingCallbackSink::failing_with(vec![CallbackFailure::Network]);
    let coordinator = coordinator(&sink, CallbackRetryPolicy::no_retry());

    let handle = coordinator
        .submit(
            DispatchPayloadBuilder::new()
                .with_player("https://p1", "alice")
                .build(),
        )
        .unwrap();

    // 投递失败不会让分发本身失败
    let result = handle.wait().await.unwrap();
    assert_eq!(result.completed_count(), 1);
    assert_eq!(sink.attempts().len(), 1);
    assert!(sink.deliveries().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_gives_up_after_max_attempts() {
    let sink = RecordingCallbackSink::failing_with(vec![CallbackFailure::ServerError; 10]);
    let coordinator = coordinator(&sink, policy(4));

    coordinator.run(request()).await;

    assert_eq!(sink.attempts().len(), 4);
    assert!(sink.deliveries().is_empty());
}
