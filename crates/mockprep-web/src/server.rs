//! Axum server setup and router construction.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use mockprep_core::Engine;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

use crate::api::{self, AppState};

/// Build the API router.
///
/// Routes:
/// - `GET /api/templates`
/// - `GET /api/sessions`, `DELETE /api/sessions`
/// - `POST /api/generate`
/// - `POST /api/evaluate`
/// - `POST /api/score`
pub fn build_router(engine: Arc<Engine>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/templates", get(api::list_templates))
        .route(
            "/api/sessions",
            get(api::list_sessions).delete(api::clear_sessions),
        )
        .route("/api/generate", post(api::generate))
        .route("/api/evaluate", post(api::evaluate))
        .route("/api/score", post(api::score))
        .with_state(AppState { engine })
        .layer(cors)
}

/// Start the server in a background task and return the bound address.
///
/// # Errors
///
/// Returns the I/O error if the address cannot be bound.
pub async fn start_server(router: Router, bind_addr: SocketAddr) -> io::Result<SocketAddr> {
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router).await {
            error!(error = %e, "server stopped");
        }
    });

    Ok(addr)
}

/// Serve until Ctrl-C is received.
///
/// # Errors
///
/// Returns the I/O error if the address cannot be bound or serving fails.
pub async fn serve(router: Router, bind_addr: SocketAddr) -> io::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "failed to listen for shutdown signal");
            }
        })
        .await
}
