use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use handshake_domain::DispatchPayload;
use tracing::debug;

use crate::error::ApiResult;
use crate::routes::AppState;

/// 受理分发请求
///
/// 校验通过后立即应答，通知和回调都在后台进行。
pub async fn dispatch(
    State(state): State<AppState>,
    payload: Result<Json<DispatchPayload>, JsonRejection>,
) -> ApiResult<StatusCode> {
    let Json(payload) = payload?;
    // 应答不等待任何通知，但后台任务可能在响应写出之前就已开始 POST 参与者
    let handle = state.coordinator.submit(payload)?;

    debug!(dispatch_id = %handle.dispatch_id, "分发已受理");
    Ok(StatusCode::OK)
}
