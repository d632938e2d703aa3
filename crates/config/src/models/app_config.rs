use anyhow::{Context, Result};
use config::{builder::DefaultState, Config as ConfigBuilder, ConfigBuilder as Builder};
use config::{Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::{
    callback::CallbackConfig, dispatch::DispatchConfig, observability::ObservabilityConfig,
    server::ServerConfig,
};

/// System configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub dispatch: DispatchConfig,
    pub callback: CallbackConfig,
    pub observability: ObservabilityConfig,
}

impl AppConfig {
    /// Load configuration from config file and environment variables
    ///
    /// Load order:
    /// 1. Default configuration
    /// 2. Config file (TOML format)
    /// 3. Environment variable overrides (prefix: HANDSHAKE_, nested keys joined by `__`)
    /// 4. Bare `PORT` variable, kept for deployments that only set the port
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        Self::load_with_port(config_path, std::env::var("PORT").ok())
    }

    /// 与 [`AppConfig::load`] 相同，但由调用方提供 `PORT` 的取值
    pub fn load_with_port(config_path: Option<&str>, port: Option<String>) -> Result<Self> {
        let mut builder = Self::with_defaults(ConfigBuilder::builder())?;

        // 1. Load config file if provided
        if let Some(path) = config_path {
            if Path::new(path).exists() {
                builder = builder.add_source(File::new(path, FileFormat::Toml));
            } else {
                return Err(anyhow::anyhow!("配置文件不存在: {}", path));
            }
        } else {
            let default_paths = ["config/handshake.toml", "handshake.toml"];
            if let Some(path) = default_paths.iter().find(|p| Path::new(p).exists()) {
                builder = builder.add_source(File::new(path, FileFormat::Toml));
            }
        }

        // 2. Environment variable overrides
        builder = builder.add_source(
            Environment::with_prefix("HANDSHAKE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        // 3. PORT
        if let Some(port) = port {
            let port: u16 = port
                .trim()
                .parse()
                .with_context(|| format!("PORT 环境变量无效: {port}"))?;
            builder = builder.set_override("server.port", i64::from(port))?;
        }

        let config: AppConfig = builder
            .build()
            .context("构建配置失败")?
            .try_deserialize()
            .context("反序列化配置失败")?;

        config.validate()?;

        Ok(config)
    }

    fn with_defaults(builder: Builder<DefaultState>) -> Result<Builder<DefaultState>> {
        let defaults = AppConfig::default();

        Ok(builder
            .set_default("server.bind_address", defaults.server.bind_address)?
            .set_default("server.port", i64::from(defaults.server.port))?
            .set_default(
                "dispatch.notify_timeout_seconds",
                defaults.dispatch.notify_timeout_seconds as i64,
            )?
            .set_default("dispatch.cancel_on_timeout", defaults.dispatch.cancel_on_timeout)?
            .set_default(
                "dispatch.drain_timeout_seconds",
                defaults.dispatch.drain_timeout_seconds as i64,
            )?
            .set_default("callback.completion_path", defaults.callback.completion_path)?
            .set_default("callback.max_attempts", i64::from(defaults.callback.max_attempts))?
            .set_default("callback.base_delay_ms", defaults.callback.base_delay_ms as i64)?
            .set_default("callback.max_delay_ms", defaults.callback.max_delay_ms as i64)?
            .set_default(
                "callback.backoff_multiplier",
                defaults.callback.backoff_multiplier,
            )?
            .set_default("callback.jitter_factor", defaults.callback.jitter_factor)?
            .set_default("observability.log_level", defaults.observability.log_level)?
            .set_default(
                "observability.log_format",
                defaults.observability.log_format.to_string(),
            )?
            .set_default(
                "observability.metrics_enabled",
                defaults.observability.metrics_enabled,
            )?
            .set_default(
                "observability.metrics_bind_address",
                defaults.observability.metrics_bind_address,
            )?)
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(toml_str).context("解析TOML配置失败")?;

        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("序列化配置为TOML失败")
    }

    /// Validate configuration effectiveness
    pub fn validate(&self) -> Result<()> {
        self.server.validate().context("服务监听配置验证失败")?;
        self.dispatch.validate().context("分发配置验证失败")?;
        self.callback.validate().context("回调配置验证失败")?;
        self.observability
            .validate()
            .context("可观测性配置验证失败")?;

        Ok(())
    }
}
