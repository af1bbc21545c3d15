//! API server lifecycle - binds the axum HTTP server and serves the
//! `/api` router until shutdown.
//!
//! bind → serve with graceful shutdown → return when the signal resolves.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

use crate::api::router::api_router;
use crate::core_state::CoreState;

/// Full application: API router plus permissive CORS for browser clients.
fn app(core: Arc<CoreState>) -> axum::Router {
    api_router(core).layer(CorsLayer::permissive())
}

/// Serve on `addr` until `shutdown` resolves. Used by the binary.
pub async fn serve<F>(core: Arc<CoreState>, addr: SocketAddr, shutdown: F) -> Result<(), String>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| format!("Failed to bind API server on {addr}: {e}"))?;
    serve_listener(core, listener, shutdown).await
}

/// Serve on an already bound listener.
pub(crate) async fn serve_listener<F>(
    core: Arc<CoreState>,
    listener: TcpListener,
    shutdown: F,
) -> Result<(), String>
where
    F: Future<Output = ()> + Send + 'static,
{
    let local = listener
        .local_addr()
        .map_err(|e| format!("Failed to get server address: {e}"))?;
    tracing::info!(addr = %local, "API server started");

    axum::serve(listener, app(core))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| format!("API server error: {e}"))?;

    tracing::info!("API server stopped");
    Ok(())
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
