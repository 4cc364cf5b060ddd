pub mod routes;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::batcher::CertificateBatcher;
use crate::ports::chain::RootRegistry;

use self::routes::{
    add_certificate_hash_handler, health_handler, retry_submission_handler, status_handler,
    AppState,
};

/// Build the axum router for the batching API.
pub fn build_router<R: RootRegistry + 'static>(batcher: Arc<CertificateBatcher<R>>) -> Router {
    let state = AppState { batcher };
    Router::new()
        .route("/", get(health_handler))
        .route("/api/addCertificateHash", post(add_certificate_hash_handler))
        .route("/api/retrySubmission", post(retry_submission_handler))
        .route("/api/status", get(status_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server.
///
/// Returns the `axum_server::Handle` for graceful shutdown and the bound address.
pub async fn start_server<R: RootRegistry + 'static>(
    batcher: Arc<CertificateBatcher<R>>,
    addr: SocketAddr,
) -> Result<(axum_server::Handle, SocketAddr), ServerError> {
    let app = build_router(batcher);

    let handle = axum_server::Handle::new();
    let server_handle = handle.clone();

    tokio::spawn(async move {
        if let Err(e) = axum_server::bind(addr)
            .handle(server_handle)
            .serve(app.into_make_service())
            .await
        {
            tracing::error!(%addr, error = %e, "HTTP server stopped");
        }
    });

    let bound_addr = handle.listening().await.ok_or(ServerError::Bind(addr))?;

    Ok((handle, bound_addr))
}

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("failed to bind HTTP server on {0}")]
    Bind(SocketAddr),
}
