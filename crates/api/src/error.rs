use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use handshake_errors::HandshakeError;
use serde_json::json;
use tracing::{error, warn};

/// API错误类型
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("分发错误: {0}")]
    Handshake(#[from] HandshakeError),

    #[error("请求体无法解析: {0}")]
    MalformedBody(String),

    #[error("内部服务器错误: {0}")]
    Internal(String),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::MalformedBody(rejection.body_text())
    }
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Handshake(e) if e.is_validation() => StatusCode::BAD_REQUEST,
            ApiError::MalformedBody(_) => StatusCode::BAD_REQUEST,
            ApiError::Handshake(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // 调用方只依赖状态码，客户端错误不附带响应体
        if status.is_client_error() {
            warn!(status = status.as_u16(), "拒绝请求: {}", self);
            return status.into_response();
        }

        error!(status = status.as_u16(), "请求处理失败: {}", self);
        let body = Json(json!({
            "error": {
                "message": self.to_string(),
                "type": "INTERNAL_ERROR",
                "code": status.as_u16(),
                "timestamp": chrono::Utc::now().to_rfc3339(),
            }
        }));

        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
