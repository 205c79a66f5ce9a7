//! Main HTTP Gateway Server.

use anyhow::{Context, Result};
use axum::{routing::get, Router};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, instrument};

use appbridge_dispatch::Dispatcher;

use crate::handlers;

/// Application state shared across routes.
#[derive(Clone)]
pub struct GatewayState {
    pub dispatcher: Dispatcher,
}

/// Build the router for one app.
///
///   GET  /manifest.json  : the app manifest
///   GET  /static/:name   : embedded assets
///   GET|POST /bindings   : binding tree for the requesting user
///   *    anything else   : call dispatch
pub fn router(dispatcher: Dispatcher) -> Router {
    Router::new()
        .route("/manifest.json", get(handlers::manifest))
        .route("/static/:name", get(handlers::static_asset))
        .route("/bindings", get(handlers::bindings).post(handlers::bindings))
        .fallback(handlers::call)
        .layer(TraceLayer::new_for_http())
        .with_state(GatewayState { dispatcher })
}

/// Bind `addr` and serve until the process ends. A bind failure is returned
/// immediately; there is no retry.
#[instrument(skip(dispatcher), fields(app_id = %dispatcher.app().manifest().app_id()))]
pub async fn start_server(addr: &str, dispatcher: Dispatcher) -> Result<()> {
    let app = router(dispatcher);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("App HTTP server listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
