use async_trait::async_trait;
use handshake_domain::{NotificationPayload, Participant};
use handshake_errors::{HandshakeError, HandshakeResult};
use tracing::{debug, warn};

/// 参与者通知接口
#[async_trait]
pub trait ParticipantNotifier: Send + Sync {
    /// 通知一个参与者。返回 Ok 表示对方确认收到，任何错误都视为未响应
    async fn notify(
        &self,
        participant: &Participant,
        payload: &NotificationPayload,
    ) -> HandshakeResult<()>;
}

/// 基于 reqwest 的参与者通知实现，向 `participant.endpoint` POST 通知体
///
/// 截止时间由协调器的竞速器控制，客户端自身的超时只用于回收未被取消的请求。
#[derive(Debug, Clone, Default)]
pub struct HttpParticipantNotifier {
    http_client: reqwest::Client,
}

impl HttpParticipantNotifier {
    pub fn with_client(http_client: reqwest::Client) -> Self {
        Self { http_client }
    }
}

#[async_trait]
impl ParticipantNotifier for HttpParticipantNotifier {
    async fn notify(
        &self,
        participant: &Participant,
        payload: &NotificationPayload,
    ) -> HandshakeResult<()> {
        let response = self
            .http_client
            .post(&participant.endpoint)
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                warn!(
                    username = %participant.identity,
                    "无法连接参与者 {}: {}",
                    participant.endpoint,
                    e
                );
                HandshakeError::notification_error(&participant.identity, e.to_string())
            })?;

        let status = response.status();
        if status.is_success() {
            debug!(username = %participant.identity, "参与者已确认: HTTP {}", status);
            Ok(())
        } else {
            warn!(username = %participant.identity, "参与者返回失败状态: HTTP {}", status);
            Err(HandshakeError::notification_error(
                &participant.identity,
                format!("HTTP {status}"),
            ))
        }
    }
}
