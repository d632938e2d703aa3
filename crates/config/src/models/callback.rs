use serde::{Deserialize, Serialize};

/// 汇总结果回调的投递策略
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CallbackConfig {
    /// 拼接在 callback_url 之后、game_id 之前的路径
    pub completion_path: String,
    /// 最大投递次数（含首次），1 表示不重试
    pub max_attempts: u32,
    /// 基础重试间隔（毫秒）
    pub base_delay_ms: u64,
    /// 最大重试间隔（毫秒）
    pub max_delay_ms: u64,
    /// 指数退避倍数
    pub backoff_multiplier: f64,
    /// 重试间隔的随机抖动范围（0.0-1.0）
    pub jitter_factor: f64,
}

impl Default for CallbackConfig {
    fn default() -> Self {
        Self {
            completion_path: "/api/game".to_string(),
            max_attempts: 3,
            base_delay_ms: 500,
            max_delay_ms: 10_000,
            backoff_multiplier: 2.0,
            jitter_factor: 0.1,
        }
    }
}

impl CallbackConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if !self.completion_path.is_empty() && !self.completion_path.starts_with('/') {
            return Err(anyhow::anyhow!(
                "回调路径必须以 / 开头: {}",
                self.completion_path
            ));
        }

        if self.max_attempts == 0 {
            return Err(anyhow::anyhow!("最大投递次数必须大于0"));
        }

        if self.max_delay_ms < self.base_delay_ms {
            return Err(anyhow::anyhow!("最大重试间隔不能小于基础重试间隔"));
        }

        if self.backoff_multiplier < 1.0 {
            return Err(anyhow::anyhow!("退避倍数不能小于1.0"));
        }

        if !(0.0..=1.0).contains(&self.jitter_factor) {
            return Err(anyhow::anyhow!(
                "抖动系数必须在0.0到1.0之间: {}",
                self.jitter_factor
            ));
        }

        Ok(())
    }
}
