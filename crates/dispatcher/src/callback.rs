use async_trait::async_trait;
use handshake_domain::FinishPayload;
use handshake_errors::{HandshakeError, HandshakeResult};
use tracing::debug;

/// 汇总结果的投递接口，每次调用只尝试一次，重试由 [`crate::retry::CallbackRetryPolicy`] 负责
#[async_trait]
pub trait CallbackSink: Send + Sync {
    async fn deliver(&self, url: &str, payload: &FinishPayload) -> HandshakeResult<()>;
}

#[derive(Debug, Clone, Default)]
pub struct HttpCallbackSink {
    http_client: reqwest::Client,
}

impl HttpCallbackSink {
    pub fn with_client(http_client: reqwest::Client) -> Self {
        Self { http_client }
    }
}

#[async_trait]
impl CallbackSink for HttpCallbackSink {
    async fn deliver(&self, url: &str, payload: &FinishPayload) -> HandshakeResult<()> {
        let response = self
            .http_client
            .post(url)
            .json(payload)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(HandshakeError::from)?;

        debug!("回调投递成功: {} HTTP {}", url, response.status());
        Ok(())
    }
}
