use axum::{
    routing::{get, post},
    Router,
};
use handshake_dispatcher::DispatchCoordinator;

use crate::handlers::{dispatch::dispatch, health::health_check};

#[derive(Clone)]
pub struct AppState {
    pub coordinator: DispatchCoordinator,
}

pub fn create_routes(state: AppState) -> Router {
    Router::new()
        .route("/", post(dispatch))
        .route("/health", get(health_check))
        .with_state(state)
}
