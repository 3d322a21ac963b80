use std::future::Future;
use std::sync::Arc;

use depot_store::ContentStore;
use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::metadata::MetaStore;
use crate::router::build_router;
use crate::state::AppState;

/// Depot large object server.
pub struct DepotServer {
    config: ServerConfig,
    state: AppState,
}

impl DepotServer {
    pub fn new(
        config: ServerConfig,
        store: Arc<dyn ContentStore>,
        meta: Arc<dyn MetaStore>,
    ) -> Self {
        let state = AppState::new(store, meta, &config.compression);
        Self { config, state }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router(self.state.clone())
    }

    /// Serve until Ctrl-C.
    pub async fn serve(self) -> ServerResult<()> {
        self.serve_with_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for shutdown signal");
            }
        })
        .await
    }

    /// Serve until `signal` resolves, then drain in-flight requests.
    pub async fn serve_with_shutdown<F>(self, signal: F) -> ServerResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        self.serve_on(listener, signal).await
    }

    /// Serve on an already bound listener.
    pub async fn serve_on<F>(self, listener: TcpListener, signal: F) -> ServerResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = self.router();
        tracing::info!(
            addr = %listener.local_addr()?,
            root = %self.config.content_root.display(),
            gzip = self.config.compression.enable_gzip,
            "Depot server listening"
        );
        axum::serve(listener, app)
            .with_graceful_shutdown(signal)
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))?;
        tracing::info!("Depot server stopped");
        Ok(())
    }
}
