//! In-memory test doubles for the dispatcher seams
//!
//! These let coordinator tests run under tokio's paused clock without any
//! network, while still recording exactly what was sent where.

use async_trait::async_trait;
use handshake_dispatcher::{CallbackSink, ParticipantNotifier};
use handshake_domain::{FinishPayload, NotificationPayload, Participant};
use handshake_errors::{HandshakeError, HandshakeResult};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;

/// How a scripted participant reacts to a notification
#[derive(Debug, Clone, PartialEq)]
pub enum NotifyBehavior {
    /// Acknowledge after the given delay
    RespondAfter(Duration),
    /// Fail with a network error after the given delay
    FailAfter(Duration),
    /// Never answer
    Hang,
}

/// A notification observed by [`ScriptedNotifier`]
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationCall {
    pub endpoint: String,
    pub identity: String,
    pub payload: NotificationPayload,
    pub started_at: Instant,
}

/// Mock implementation of ParticipantNotifier keyed by participant endpoint
#[derive(Debug, Clone)]
pub struct ScriptedNotifier {
    behaviors: Arc<Mutex<HashMap<String, NotifyBehavior>>>,
    default_behavior: NotifyBehavior,
    calls: Arc<Mutex<Vec<NotificationCall>>>,
}

impl ScriptedNotifier {
    pub fn new() -> Self {
        Self {
            behaviors: Arc::new(Mutex::new(HashMap::new())),
            default_behavior: NotifyBehavior::RespondAfter(Duration::ZERO),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_default(mut self, behavior: NotifyBehavior) -> Self {
        self.default_behavior = behavior;
        self
    }

    pub fn with(self, endpoint: &str, behavior: NotifyBehavior) -> Self {
        self.behaviors
            .lock()
            .unwrap()
            .insert(endpoint.to_string(), behavior);
        self
    }

    pub fn calls(&self) -> Vec<NotificationCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn behavior_for(&self, endpoint: &str) -> NotifyBehavior {
        self.behaviors
            .lock()
            .unwrap()
            .get(endpoint)
            .cloned()
            .unwrap_or_else(|| self.default_behavior.clone())
    }
}

impl Default for ScriptedNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ParticipantNotifier for ScriptedNotifier {
    async fn notify(
        &self,
        participant: &Participant,
        payload: &NotificationPayload,
    ) -> HandshakeResult<()> {
        self.calls.lock().unwrap().push(NotificationCall {
            endpoint: participant.endpoint.clone(),
            identity: participant.identity.clone(),
            payload: payload.clone(),
            started_at: Instant::now(),
        });

        match self.behavior_for(&participant.endpoint) {
            NotifyBehavior::RespondAfter(delay) => {
                tokio::time::sleep(delay).await;
                Ok(())
            }
            NotifyBehavior::FailAfter(delay) => {
                tokio::time::sleep(delay).await;
                Err(HandshakeError::Network(format!(
                    "connection refused: {}",
                    participant.endpoint
                )))
            }
            NotifyBehavior::Hang => std::future::pending().await,
        }
    }
}

/// Failure injected into a single callback delivery attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackFailure {
    Network,
    ServerError,
    Rejected(u16),
}

impl CallbackFailure {
    fn into_error(self) -> HandshakeError {
        match self {
            CallbackFailure::Network => HandshakeError::Network("connection reset".to_string()),
            CallbackFailure::ServerError => HandshakeError::callback_error("HTTP 503"),
            CallbackFailure::Rejected(status) => HandshakeError::CallbackRejected { status },
        }
    }
}

/// A callback attempt observed by [`RecordingCallbackSink`]
#[derive(Debug, Clone, PartialEq)]
pub struct CallbackAttempt {
    pub url: String,
    pub payload: FinishPayload,
    pub at: Instant,
    pub succeeded: bool,
}

/// Mock implementation of CallbackSink that records every attempt
#[derive(Debug, Clone, Default)]
pub struct RecordingCallbackSink {
    failures: Arc<Mutex<VecDeque<CallbackFailure>>>,
    attempts: Arc<Mutex<Vec<CallbackAttempt>>>,
    delivered: Arc<Notify>,
}

impl RecordingCallbackSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// The next attempts fail in the given order, later ones succeed
    pub fn failing_with(failures: Vec<CallbackFailure>) -> Self {
        Self {
            failures: Arc::new(Mutex::new(failures.into())),
            ..Self::default()
        }
    }

    pub fn attempts(&self) -> Vec<CallbackAttempt> {
        self.attempts.lock().unwrap().clone()
    }

    pub fn deliveries(&self) -> Vec<CallbackAttempt> {
        self.attempts()
            .into_iter()
            .filter(|a| a.succeeded)
            .collect()
    }

    /// Wait until at least one successful delivery has been recorded
    pub async fn wait_for_delivery(&self) {
        loop {
            let notified = self.delivered.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if !self.deliveries().is_empty() {
                return;
            }
            notified.await;
        }
    }
}

#[async_trait]
impl CallbackSink for RecordingCallbackSink {
    async fn deliver(&self, url: &str, payload: &FinishPayload) -> HandshakeResult<()> {
        let failure = self.failures.lock().unwrap().pop_front();

        self.attempts.lock().unwrap().push(CallbackAttempt {
            url: url.to_string(),
            payload: payload.clone(),
            at: Instant::now(),
            succeeded: failure.is_none(),
        });

        match failure {
            Some(failure) => Err(failure.into_error()),
            None => {
                self.delivered.notify_waiters();
                Ok(())
            }
        }
    }
}
