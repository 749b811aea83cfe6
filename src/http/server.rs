//! HTTP server setup.
//!
//! # Responsibilities
//! - Create the axum Router with the pipeline handler on every path
//! - Wire up middleware (timeout, tracing)
//! - Serve with graceful shutdown

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::Response,
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::pipeline::PipelineHandler;

/// HTTP server wrapping one configured pipeline handler.
pub struct GatewayServer {
    router: Router,
}

impl GatewayServer {
    pub fn new(handler: Arc<PipelineHandler>, request_timeout: Duration) -> Self {
        #[allow(deprecated)]
        let router = Router::new()
            .route("/{*path}", any(gateway_handler))
            .route("/", any(gateway_handler))
            .with_state(handler)
            .layer(TimeoutLayer::new(request_timeout))
            .layer(TraceLayer::new_for_http());
        Self { router }
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "gateway listening");

        let app = self.router.into_make_service();
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("gateway stopped");
        Ok(())
    }
}

async fn gateway_handler(
    State(handler): State<Arc<PipelineHandler>>,
    request: Request<Body>,
) -> Response {
    handler.handle(request).await
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        tracing::error!("failed to install Ctrl+C handler");
    }
    tracing::info!("shutdown signal received");
}
