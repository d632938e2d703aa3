use std::time::Duration;

use handshake_config::CallbackConfig;
use handshake_domain::FinishPayload;
use tracing::{error, info, warn};

use crate::callback::CallbackSink;

/// 回调重试策略配置
#[derive(Debug, Clone, PartialEq)]
pub struct CallbackRetryPolicy {
    /// 最大投递次数（含首次）
    pub max_attempts: u32,
    /// 基础重试间隔
    pub base_delay: Duration,
    /// 最大重试间隔
    pub max_delay: Duration,
    /// 指数退避倍数
    pub backoff_multiplier: f64,
    /// 重试间隔的随机抖动范围（0.0-1.0）
    pub jitter_factor: f64,
}

impl Default for CallbackRetryPolicy {
    fn default() -> Self {
        Self::from(&CallbackConfig::default())
    }
}

impl From<&CallbackConfig> for CallbackRetryPolicy {
    fn from(config: &CallbackConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: Duration::from_millis(config.base_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
            backoff_multiplier: config.backoff_multiplier,
            jitter_factor: config.jitter_factor,
        }
    }
}

/// 一次回调投递的最终结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReport {
    pub attempts: u32,
    pub delivered: bool,
    pub last_error: Option<String>,
}

impl CallbackRetryPolicy {
    /// 只投递一次，失败即放弃
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// 第 `attempt` 次失败之后需要等待的时间（attempt 从 1 开始）
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let base_interval = self.base_delay.as_secs_f64();
        let max_interval = self.max_delay.as_secs_f64();
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;

        // 计算指数退避间隔
        let exponential_interval = base_interval * self.backoff_multiplier.powi(exponent);

        // 限制最大间隔
        let capped_interval = exponential_interval.min(max_interval);

        // 添加随机抖动以避免雷群效应
        let jitter = capped_interval * self.jitter_factor * (rand::random::<f64>() - 0.5) * 2.0;
        let final_interval = (capped_interval + jitter)
            .min(max_interval)
            .max(base_interval);

        Duration::from_secs_f64(final_interval)
    }

    /// 按策略投递汇总结果。失败不会向上传播，只记录日志并体现在报告中
    pub async fn deliver(
        &self,
        sink: &dyn CallbackSink,
        url: &str,
        payload: &FinishPayload,
    ) -> DeliveryReport {
        let mut attempt = 0;

        loop {
            attempt += 1;

            match sink.deliver(url, payload).await {
                Ok(()) => {
                    info!(attempt, "汇总结果已投递到 {}", url);
                    return DeliveryReport {
                        attempts: attempt,
                        delivered: true,
                        last_error: None,
                    };
                }
                Err(e) if e.is_retryable() && attempt < self.max_attempts => {
                    let delay = self.delay_for(attempt);
                    warn!(attempt, "回调投递失败，{:?} 后重试: {}", delay, e);
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    error!(attempt, "回调投递最终失败，放弃: {} - {}", url, e);
                    return DeliveryReport {
                        attempts: attempt,
                        delivered: false,
                        last_error: Some(e.to_string()),
                    };
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> CallbackRetryPolicy {
        CallbackRetryPolicy {
            max_attempts: 5,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(1000),
            backoff_multiplier: 2.0,
            jitter_factor: 0.0,
        }
    }

    #[test]
    fn test_delay_grows_exponentially() {
        let policy = policy();
        assert_eq!(policy.delay_for(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for(2), Duration::from_millis(200));
        assert_eq!(policy.delay_for(3), Duration::from_millis(400));
    }

    #[test]
    fn test_delay_is_capped() {
        let policy = policy();
        assert_eq!(policy.delay_for(10), Duration::from_millis(1000));
        assert_eq!(policy.delay_for(u32::MAX), Duration::from_millis(1000));
    }

    #[test]
    fn test_jitter_stays_within_bounds() {
        let policy = CallbackRetryPolicy {
            jitter_factor: 0.5,
            ..policy()
        };
        for _ in 0..100 {
            let delay = policy.delay_for(2);
            assert!(delay >= Duration::from_millis(100));
            assert!(delay <= Duration::from_millis(300));
        }
    }

    #[test]
    fn test_from_config() {
        let config = CallbackConfig {
            max_attempts: 4,
            base_delay_ms: 250,
            ..CallbackConfig::default()
        };
        let policy = CallbackRetryPolicy::from(&config);
        assert_eq!(policy.max_attempts, 4);
        assert_eq!(policy.base_delay, Duration::from_millis(250));
        assert_eq!(CallbackRetryPolicy::no_retry().max_attempts, 1);
    }
}
