use super::shutdown::shutdown_signal;
use crate::errors::handlers::not_found;
use axum::{Json, Router, routing::get};
use core_config::server::ServerConfig;
use std::future::IntoFuture;
use std::io;
use std::net::SocketAddr;
use tokio::sync::oneshot;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{Level, info, warn};
use utoipa::OpenApi;

/// Starts the Axum server with graceful shutdown.
///
/// The peer address is exposed to handlers and middleware as
/// `ConnectInfo<SocketAddr>`. Once a shutdown signal arrives, in-flight
/// requests get `server_config.shutdown_timeout` to finish before the
/// remaining connections are dropped.
///
/// # Errors
/// Returns an error if the listener cannot bind to the configured address or
/// the server fails while running.
pub async fn create_app(router: Router, server_config: &ServerConfig) -> io::Result<()> {
    let listener = tokio::net::TcpListener::bind(server_config.address()).await?;
    info!("Server starting on {}", listener.local_addr()?);

    let (signalled_tx, signalled_rx) = oneshot::channel::<()>();
    let signal = async move {
        shutdown_signal().await;
        let _ = signalled_tx.send(());
    };

    let server = axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(signal)
    .into_future();

    let timeout = server_config.shutdown_timeout;
    let deadline = async move {
        match signalled_rx.await {
            Ok(()) => tokio::time::sleep(timeout).await,
            Err(_) => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        result = server => {
            result.inspect_err(|e| {
                tracing::error!("Server encountered an error: {:?}", e);
            })?;
            info!("Server stopped");
        }
        _ = deadline => {
            warn!("Graceful shutdown exceeded {:?}, dropping open connections", timeout);
        }
    }

    Ok(())
}

/// Creates the top-level router.
///
/// - API routes nested under `/api`
/// - OpenAPI document at `/api-docs/openapi.json`
/// - Request tracing
/// - Envelope-shaped 404 fallback
///
/// Domain routers apply their own state; CORS and audit layers belong on
/// `apis` so they only cover the `/api` tree.
pub fn create_router<T>(apis: Router) -> Router
where
    T: OpenApi + 'static,
{
    Router::new()
        .route("/api-docs/openapi.json", get(|| async { Json(T::openapi()) }))
        .nest("/api", apis)
        .fallback(not_found)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}
