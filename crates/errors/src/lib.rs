use thiserror::Error;

#[derive(Debug, Error)]
pub enum HandshakeError {
    #[error("请求验证失败: {0}")]
    Validation(String),
    #[error("参与者通知失败: {participant} - {message}")]
    Notification {
        participant: String,
        message: String,
    },
    #[error("操作超时: {0}")]
    Timeout(String),
    #[error("回调投递失败: {0}")]
    CallbackDelivery(String),
    #[error("回调被拒绝: HTTP {status}")]
    CallbackRejected { status: u16 },
    #[error("网络错误: {0}")]
    Network(String),
    #[error("内部错误: {0}")]
    Internal(String),
}

pub type HandshakeResult<T> = Result<T, HandshakeError>;

impl HandshakeError {
    pub fn validation_error<S: Into<String>>(msg: S) -> Self {
        Self::Validation(msg.into())
    }
    pub fn notification_error<P: Into<String>, S: Into<String>>(participant: P, msg: S) -> Self {
        Self::Notification {
            participant: participant.into(),
            message: msg.into(),
        }
    }
    pub fn callback_error<S: Into<String>>(msg: S) -> Self {
        Self::CallbackDelivery(msg.into())
    }
    pub fn is_validation(&self) -> bool {
        matches!(self, HandshakeError::Validation(_))
    }
    /// 回调投递时判断是否值得再试一次；4xx 拒绝属于终态
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            HandshakeError::CallbackDelivery(_)
                | HandshakeError::Network(_)
                | HandshakeError::Timeout(_)
        )
    }
}

/// 所有出站 HTTP 调用的错误都经由这里分类
impl From<reqwest::Error> for HandshakeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            HandshakeError::Timeout(err.to_string())
        } else if let Some(status) = err.status() {
            if status.is_client_error() {
                HandshakeError::CallbackRejected {
                    status: status.as_u16(),
                }
            } else {
                HandshakeError::CallbackDelivery(format!("HTTP {status}"))
            }
        } else {
            HandshakeError::Network(err.to_string())
        }
    }
}

#[cfg(test)]
mod error_tests {
    use crate::*;

    #[test]
    fn test_handshake_error_display() {
        let validation = HandshakeError::Validation("game_id 缺失".to_string());
        assert_eq!(validation.to_string(), "请求验证失败: game_id 缺失");

        let notification = HandshakeError::notification_error("alice", "connection refused");
        assert_eq!(
            notification.to_string(),
            "参与者通知失败: alice - connection refused"
        );

        let rejected = HandshakeError::CallbackRejected { status: 401 };
        assert_eq!(rejected.to_string(), "回调被拒绝: HTTP 401");
    }

    #[test]
    fn test_retryable_classification() {
        assert!(HandshakeError::Network("reset".to_string()).is_retryable());
        assert!(HandshakeError::Timeout("slow".to_string()).is_retryable());
        assert!(HandshakeError::callback_error("HTTP 503").is_retryable());

        assert!(!HandshakeError::CallbackRejected { status: 400 }.is_retryable());
        assert!(!HandshakeError::validation_error("players 为空").is_retryable());
        assert!(!HandshakeError::Internal("bug".to_string()).is_retryable());
    }

    #[test]
    fn test_is_validation() {
        assert!(HandshakeError::validation_error("x").is_validation());
        assert!(!HandshakeError::Timeout("x".to_string()).is_validation());
    }
}
