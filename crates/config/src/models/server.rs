use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl ServerConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        self.socket_addr()?;

        if self.port == 0 {
            return Err(anyhow::anyhow!("监听端口必须大于0"));
        }

        Ok(())
    }

    /// 组合出完整的监听地址
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        let ip = self
            .bind_address
            .parse::<IpAddr>()
            .map_err(|e| anyhow::anyhow!("监听地址格式无效: {} ({e})", self.bind_address))?;
        Ok(SocketAddr::new(ip, self.port))
    }
}
