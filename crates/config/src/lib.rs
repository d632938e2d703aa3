//! 握手分发服务的配置模型。
//!
//! 所有可调参数在进程启动时一次性加载为 [`AppConfig`]，之后以值或引用的形式
//! 传入各组件，请求处理期间不再读取环境变量。

pub mod models;

pub use models::{
    AppConfig, CallbackConfig, DispatchConfig, LogFormat, ObservabilityConfig, ServerConfig,
};
