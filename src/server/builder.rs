//! ServerBuilder for fluent API to build HTTP servers

use super::exposure::RestExposure;
use super::host::ServerHost;
use crate::config::IntakeConfig;
use crate::core::service::ServiceConnector;
use crate::intake::pipeline::Clock;
use anyhow::Result;
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Builder for the order-form HTTP server
///
/// # Example
///
/// ```ignore
/// let app = ServerBuilder::new()
///     .with_config(IntakeConfig::from_yaml_file("orderform.yaml")?)
///     .with_connector(InMemoryBackend::new(["Detail", "Rekap"]))
///     .build()?;
/// ```
pub struct ServerBuilder {
    config: Option<IntakeConfig>,
    connector: Option<Arc<dyn ServiceConnector>>,
    clock: Option<Arc<dyn Clock>>,
    custom_routes: Vec<Router>,
}

impl ServerBuilder {
    pub fn new() -> Self {
        Self {
            config: None,
            connector: None,
            clock: None,
            custom_routes: Vec::new(),
        }
    }

    /// Set the configuration (required)
    pub fn with_config(mut self, config: IntakeConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the service backend (required)
    pub fn with_connector(mut self, connector: impl ServiceConnector + 'static) -> Self {
        self.connector = Some(Arc::new(connector));
        self
    }

    /// Set an already shared service backend
    pub fn with_connector_arc(mut self, connector: Arc<dyn ServiceConnector>) -> Self {
        self.connector = Some(connector);
        self
    }

    /// Override the submission timestamp source
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Some(Arc::new(clock));
        self
    }

    /// Add custom routes to the server
    pub fn with_custom_routes(mut self, routes: Router) -> Self {
        self.custom_routes.push(routes);
        self
    }

    /// Build the transport-agnostic host
    pub fn build_host(mut self) -> Result<ServerHost> {
        let config = self
            .config
            .take()
            .ok_or_else(|| anyhow::anyhow!("Configuration is required. Call .with_config()"))?;
        let connector = self.connector.take().ok_or_else(|| {
            anyhow::anyhow!("A service connector is required. Call .with_connector()")
        })?;

        Ok(ServerHost::new(config, connector, self.clock.take()))
    }

    /// Build the final REST router
    pub fn build(mut self) -> Result<Router> {
        let custom_routes = std::mem::take(&mut self.custom_routes);
        let host = Arc::new(self.build_host()?);
        RestExposure::build_router(host, custom_routes)
    }

    /// Serve the application with graceful shutdown
    ///
    /// Binds to `server.bind` from the configuration and handles SIGTERM and
    /// SIGINT (Ctrl+C).
    pub async fn serve(self) -> Result<()> {
        let addr = self
            .config
            .as_ref()
            .map(|config| config.server.bind.clone())
            .ok_or_else(|| anyhow::anyhow!("Configuration is required. Call .with_config()"))?;

        let app = self.build()?;
        let listener = TcpListener::bind(&addr).await?;

        tracing::info!("Server listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Wait for shutdown signal (SIGTERM or Ctrl+C)
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal, initiating graceful shutdown...");
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intake::pipeline::FixedClock;
    use crate::storage::InMemoryBackend;
    use chrono::Local;

    #[test]
    fn test_new_creates_empty_builder() {
        let builder = ServerBuilder::new();
        assert!(builder.config.is_none());
        assert!(builder.connector.is_none());
        assert!(builder.clock.is_none());
        assert!(builder.custom_routes.is_empty());
    }

    #[test]
    fn test_build_host_without_config_fails() {
        let result = ServerBuilder::new()
            .with_connector(InMemoryBackend::default())
            .build_host();
        let err_msg = format!("{}", result.err().expect("should be Err"));
        assert!(err_msg.contains("Configuration is required"), "{}", err_msg);
    }

    #[test]
    fn test_build_host_without_connector_fails() {
        let result = ServerBuilder::new()
            .with_config(IntakeConfig::default_config())
            .build_host();
        let err_msg = format!("{}", result.err().expect("should be Err"));
        assert!(err_msg.contains("service connector is required"), "{}", err_msg);
    }

    #[test]
    fn test_build_host_uses_config_catalog() {
        let mut config = IntakeConfig::default_config();
        config.catalog.max_quantity = 12;

        let host = ServerBuilder::new()
            .with_config(config)
            .with_connector(InMemoryBackend::default())
            .with_clock(FixedClock(Local::now()))
            .build_host()
            .expect("build_host should succeed");

        assert_eq!(host.pipeline.catalog().max_quantity, 12);
    }

    #[test]
    fn test_with_custom_routes_appends_router() {
        let builder = ServerBuilder::new()
            .with_custom_routes(Router::new())
            .with_custom_routes(Router::new());
        assert_eq!(builder.custom_routes.len(), 2);
    }

    #[test]
    fn test_build_with_custom_routes() {
        use axum::routing::get;

        let custom = Router::new().route("/custom", get(|| async { "ok" }));
        let router = ServerBuilder::new()
            .with_config(IntakeConfig::default_config())
            .with_connector(InMemoryBackend::default())
            .with_custom_routes(custom)
            .build();
        assert!(router.is_ok());
    }
}
