pub mod response;

use axum::{
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::signal;
use tokio::sync::oneshot;
use tracing::info;

use crate::config::Config;
use crate::features::{self, FeatureState};
use crate::middleware;

/// Build the application router with all routes and middleware
pub fn create_router(state: FeatureState, config: &Config) -> Router {
    let body_limit = usize::try_from(config.upload.max_body_bytes).unwrap_or(usize::MAX);

    Router::new()
        .route("/status", get(status))
        .route("/health", get(health_check))
        .with_state(state.clone())
        .merge(features::router(state))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(middleware::tracing_layer())
        .layer(middleware::cors_layer(&config.cors))
}

/// Bind the listener and serve until a shutdown signal arrives.
///
/// In-flight requests get `shutdown_timeout_secs` to finish once the signal
/// is received; connections still open after that are dropped.
pub async fn serve(state: FeatureState, config: &Config) -> anyhow::Result<()> {
    let app = create_router(state, config);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    let (signalled_tx, signalled_rx) = oneshot::channel::<()>();
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            let _ = signalled_tx.send(());
        })
        .into_future();

    let grace = Duration::from_secs(config.server.shutdown_timeout_secs);
    let drain_deadline = async move {
        match signalled_rx.await {
            Ok(()) => {
                info!("Waiting up to {} seconds for connections to close", grace.as_secs());
                tokio::time::sleep(grace).await;
            },
            Err(_) => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        result = server => result?,
        _ = drain_deadline => {
            tracing::warn!("Shutdown grace period elapsed, dropping open connections");
        },
    }

    info!("Server shut down gracefully");
    Ok(())
}

async fn status() -> impl IntoResponse {
    info!("Status endpoint accessed");
    Json(json!({ "message": "API SERVICE RUNNING" }))
}

/// Health check handler
async fn health_check(State(state): State<FeatureState>) -> Response {
    match state.catalog.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "healthy",
                "database": "connected"
            })),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Database health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "unhealthy",
                    "database": e.to_string()
                })),
            )
                .into_response()
        },
    }
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        },
    }
}
