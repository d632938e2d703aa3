//! # Handshake API
//!
//! 握手分发服务的 HTTP 入口，基于 Axum 构建。
//!
//! ## API 端点
//!
//! - `POST /` 受理一次分发请求。请求合法时立即返回空的 `200 OK`，
//!   缺少必填字段或请求体不是 JSON 时返回空的 `400 Bad Request`。
//!   分发结果只通过回调送达，不会出现在响应里。
//! - `GET /health` 健康检查，附带当前进行中的分发数量。
//!
//! ## 中间件
//!
//! 所有请求依次经过 `TraceLayer`、CORS 和请求日志中间件。

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;

use axum::Router;
use handshake_dispatcher::DispatchCoordinator;
use tower::ServiceBuilder;

use middleware::{cors_layer, request_logging, trace_layer};
use routes::{create_routes, AppState};

pub use error::ApiError;

/// 创建完整的API应用
pub fn create_app(coordinator: DispatchCoordinator) -> Router {
    let state = AppState { coordinator };

    create_routes(state).layer(
        ServiceBuilder::new()
            .layer(trace_layer())
            .layer(cors_layer())
            .layer(axum::middleware::from_fn(request_logging)),
    )
}
