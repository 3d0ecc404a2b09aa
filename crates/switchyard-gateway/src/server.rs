use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tracing::info;

use switchyard_core::config::GatewayConfig;
use switchyard_flow::Orchestrator;

use crate::dispatcher::OperationDispatcher;
use crate::routes;
use crate::state::AppState;

/// HTTP gateway exposing the operation dispatcher, built on axum.
pub struct GatewayServer {
    config: GatewayConfig,
    orchestrator: Arc<Orchestrator>,
}

impl GatewayServer {
    pub fn new(config: GatewayConfig, orchestrator: Arc<Orchestrator>) -> Self {
        Self {
            config,
            orchestrator,
        }
    }

    fn router(&self, shutdown: CancellationToken) -> Router {
        let state = Arc::new(AppState {
            dispatcher: OperationDispatcher::new(self.orchestrator.clone())
                .with_shutdown(shutdown),
        });

        Router::new()
            .route("/api/health", get(routes::health))
            .route("/api/operations/{name}", post(routes::operation))
            .layer(CorsLayer::permissive())
            .with_state(state)
    }

    /// Run the gateway server until the cancellation token is triggered.
    pub async fn run(&self, shutdown: CancellationToken) -> anyhow::Result<()> {
        let app = self.router(shutdown.clone());

        let listener = TcpListener::bind(&self.config.bind).await?;
        info!(bind = %self.config.bind, "Gateway listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await?;

        info!("Gateway shut down");
        Ok(())
    }
}
