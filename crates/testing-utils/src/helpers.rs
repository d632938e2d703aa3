//! HTTP stub servers for end-to-end tests
//!
//! Each stub binds `127.0.0.1:0` and runs on the current tokio runtime until
//! it is dropped.

use axum::{extract::State, http::StatusCode, http::Uri, routing::post, Json, Router};
use handshake_domain::{FinishPayload, NotificationPayload};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::mocks::NotifyBehavior;

async fn serve(router: Router) -> (SocketAddr, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind stub listener");
    let addr = listener.local_addr().expect("Failed to read stub address");
    let handle = tokio::spawn(async move {
        axum::serve(listener, router)
            .await
            .expect("Stub server failed");
    });
    (addr, handle)
}

#[derive(Clone)]
struct ParticipantState {
    behavior: NotifyBehavior,
    received: Arc<Mutex<Vec<NotificationPayload>>>,
}

/// A participant game server that answers notifications according to a [`NotifyBehavior`]
pub struct StubParticipant {
    addr: SocketAddr,
    received: Arc<Mutex<Vec<NotificationPayload>>>,
    handle: JoinHandle<()>,
}

impl StubParticipant {
    pub async fn spawn(behavior: NotifyBehavior) -> Self {
        let received = Arc::new(Mutex::new(Vec::new()));
        let state = ParticipantState {
            behavior,
            received: received.clone(),
        };
        let router = Router::new()
            .route("/", post(participant_handler))
            .with_state(state);
        let (addr, handle) = serve(router).await;

        Self {
            addr,
            received,
            handle,
        }
    }

    pub fn endpoint(&self) -> String {
        format!("http://{}/", self.addr)
    }

    pub fn received(&self) -> Vec<NotificationPayload> {
        self.received.lock().unwrap().clone()
    }
}

impl Drop for StubParticipant {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn participant_handler(
    State(state): State<ParticipantState>,
    Json(payload): Json<NotificationPayload>,
) -> StatusCode {
    state.received.lock().unwrap().push(payload);

    match state.behavior {
        NotifyBehavior::RespondAfter(delay) => {
            tokio::time::sleep(delay).await;
            StatusCode::OK
        }
        NotifyBehavior::FailAfter(delay) => {
            tokio::time::sleep(delay).await;
            StatusCode::INTERNAL_SERVER_ERROR
        }
        NotifyBehavior::Hang => std::future::pending().await,
    }
}

#[derive(Clone)]
struct OrchestratorState {
    status: StatusCode,
    sender: mpsc::UnboundedSender<(String, FinishPayload)>,
}

/// The orchestrator side: accepts aggregate callbacks on any path
pub struct StubOrchestrator {
    addr: SocketAddr,
    receiver: tokio::sync::Mutex<mpsc::UnboundedReceiver<(String, FinishPayload)>>,
    handle: JoinHandle<()>,
}

impl StubOrchestrator {
    pub async fn spawn() -> Self {
        Self::spawn_with_status(StatusCode::OK).await
    }

    /// Every callback is recorded, then answered with `status`
    pub async fn spawn_with_status(status: StatusCode) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let router = Router::new()
            .fallback(orchestrator_handler)
            .with_state(OrchestratorState { status, sender });
        let (addr, handle) = serve(router).await;

        Self {
            addr,
            receiver: tokio::sync::Mutex::new(receiver),
            handle,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Next callback as `(path, payload)`, or `None` if nothing arrives in time
    pub async fn next_callback(&self, wait: Duration) -> Option<(String, FinishPayload)> {
        let mut receiver = self.receiver.lock().await;
        tokio::time::timeout(wait, receiver.recv())
            .await
            .ok()
            .flatten()
    }
}

impl Drop for StubOrchestrator {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn orchestrator_handler(
    State(state): State<OrchestratorState>,
    uri: Uri,
    Json(payload): Json<FinishPayload>,
) -> StatusCode {
    let _ = state.sender.send((uri.path().to_string(), payload));
    state.status
}
