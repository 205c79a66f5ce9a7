//! Route handlers.
//!
//! Every call answers HTTP 200 with a JSON call response, including error
//! envelopes. Only requests for unknown paths or assets get a 404.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::debug;

use appbridge_dispatch::DispatchError;

use crate::server::GatewayState;

/// GET /manifest.json
pub async fn manifest(State(state): State<GatewayState>) -> Response {
    (
        [(header::CONTENT_TYPE, "application/json")],
        state.dispatcher.app().manifest_json().to_string(),
    )
        .into_response()
}

/// GET /static/:name
pub async fn static_asset(
    Path(name): Path<String>,
    State(state): State<GatewayState>,
) -> Response {
    match state.dispatcher.app().asset(&name) {
        Some(asset) => (
            [
                (header::CONTENT_TYPE, asset.content_type),
                (header::CACHE_CONTROL, "public, max-age=86400"),
            ],
            asset.bytes,
        )
            .into_response(),
        None => {
            debug!(name = %name, "Unknown static asset");
            (StatusCode::NOT_FOUND, "Static asset not found").into_response()
        }
    }
}

/// GET|POST /bindings
pub async fn bindings(State(state): State<GatewayState>, body: Bytes) -> Response {
    Json(state.dispatcher.bindings(&body)).into_response()
}

/// Any other path: dispatch to the registered call handler.
pub async fn call(State(state): State<GatewayState>, uri: Uri, body: Bytes) -> Response {
    match state.dispatcher.dispatch(uri.path(), &body).await {
        Ok(response) => Json(response).into_response(),
        Err(e @ DispatchError::NotFound { .. }) => {
            (StatusCode::NOT_FOUND, Json(json!({ "error": e.to_string() }))).into_response()
        }
    }
}
