use anyhow::{Context, Result};
use handshake_api::create_app;
use handshake_config::AppConfig;
use handshake_dispatcher::DispatchCoordinator;
use tokio::{net::TcpListener, sync::broadcast};
use tracing::{info, warn};

/// 握手分发服务
pub struct Application {
    config: AppConfig,
    coordinator: DispatchCoordinator,
}

impl Application {
    /// 使用 HTTP 通知器和回调投递器创建应用
    pub fn new(config: AppConfig) -> Result<Self> {
        let coordinator = DispatchCoordinator::with_http(&config).context("创建HTTP客户端失败")?;
        Ok(Self::with_coordinator(config, coordinator))
    }

    pub fn with_coordinator(config: AppConfig, coordinator: DispatchCoordinator) -> Self {
        Self {
            config,
            coordinator,
        }
    }

    pub fn coordinator(&self) -> &DispatchCoordinator {
        &self.coordinator
    }

    /// 绑定配置中的地址并运行，直到收到关闭信号
    pub async fn run(&self, shutdown_rx: broadcast::Receiver<()>) -> Result<()> {
        let addr = self.config.server.socket_addr()?;
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("绑定地址失败: {addr}"))?;

        self.serve(listener, shutdown_rx).await
    }

    /// 在给定的监听器上提供服务
    ///
    /// 收到关闭信号后先停止接收新请求，再在 `drain_timeout` 内等待进行中的
    /// 分发投递完回调。
    pub async fn serve(
        &self,
        listener: TcpListener,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) -> Result<()> {
        let local_addr = listener.local_addr().context("读取监听地址失败")?;
        info!(
            notify_timeout = ?self.config.dispatch.notify_timeout(),
            "握手分发服务启动在 http://{local_addr}"
        );

        let app = create_app(self.coordinator.clone());
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
                info!("HTTP服务器收到关闭信号");
            })
            .await
            .context("HTTP服务器运行失败")?;

        self.drain().await;
        Ok(())
    }

    async fn drain(&self) {
        let in_flight = self.coordinator.in_flight();
        if in_flight == 0 {
            return;
        }

        let drain_timeout = self.config.dispatch.drain_timeout();
        info!(in_flight, "等待进行中的分发完成（超时: {:?}）", drain_timeout);

        match tokio::time::timeout(drain_timeout, self.coordinator.wait_idle()).await {
            Ok(()) => info!("所有分发已完成"),
            Err(_) => warn!(
                remaining = self.coordinator.in_flight(),
                "等待分发完成超时，放弃剩余分发"
            ),
        }
    }
}
