pub mod app_config;
pub mod callback;
pub mod dispatch;
pub mod observability;
pub mod server;

// Re-export main types for easier imports
pub use app_config::AppConfig;
pub use callback::CallbackConfig;
pub use dispatch::DispatchConfig;
pub use observability::{LogFormat, ObservabilityConfig};
pub use server::ServerConfig;
