use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 出站 HTTP 请求的硬上限是通知截止时间的倍数
const REQUEST_CEILING_FACTOR: u32 = 4;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DispatchConfig {
    /// 单个参与者通知的截止时间
    pub notify_timeout_seconds: u64,
    /// 超时后是否丢弃仍在进行的通知请求。默认只停止等待，请求本身继续运行
    pub cancel_on_timeout: bool,
    /// 关闭时等待进行中分发完成的最长时间
    pub drain_timeout_seconds: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            notify_timeout_seconds: 30,
            cancel_on_timeout: false,
            drain_timeout_seconds: 45,
        }
    }
}

impl DispatchConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.notify_timeout_seconds == 0 {
            return Err(anyhow::anyhow!("通知超时时间必须大于0"));
        }

        Ok(())
    }

    pub fn notify_timeout(&self) -> Duration {
        Duration::from_secs(self.notify_timeout_seconds)
    }

    pub fn drain_timeout(&self) -> Duration {
        Duration::from_secs(self.drain_timeout_seconds)
    }

    /// HTTP 客户端的请求超时。截止时间之后未被取消的通知最迟在这里被回收
    pub fn request_ceiling(&self) -> Duration {
        self.notify_timeout() * REQUEST_CEILING_FACTOR
    }
}
