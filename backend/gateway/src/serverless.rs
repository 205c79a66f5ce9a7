//! Function-invocation deploy variant.
//!
//! The platform hands the app one API-gateway style proxy event per request.
//! The event is replayed against the same [`Router`] the HTTP listener uses,
//! so both deploy types expose an identical contract.

use std::collections::HashMap;

use anyhow::{Context, Result};
use axum::{
    body::Body,
    http::{header, Request},
    Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use tower::ServiceExt;
use tracing::debug;

/// Upper bound on a response body collected from the router.
const MAX_RESPONSE_BYTES: usize = 8 * 1024 * 1024;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyRequest {
    #[serde(default = "default_method")]
    pub http_method: String,
    pub path: String,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub is_base64_encoded: bool,
}

fn default_method() -> String {
    "POST".to_string()
}

impl Default for ProxyRequest {
    fn default() -> Self {
        Self {
            http_method: default_method(),
            path: "/".to_string(),
            headers: HashMap::new(),
            body: None,
            is_base64_encoded: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyResponse {
    pub status_code: u16,
    pub headers: HashMap<String, String>,
    pub body: String,
    pub is_base64_encoded: bool,
}

/// Run one proxy event through `router`.
pub async fn invoke(router: Router, event: ProxyRequest) -> Result<ProxyResponse> {
    let body = match event.body {
        Some(body) if event.is_base64_encoded => {
            STANDARD.decode(body).context("request body is not valid base64")?
        }
        Some(body) => body.into_bytes(),
        None => Vec::new(),
    };

    let mut builder = Request::builder().method(event.http_method.as_str()).uri(&event.path);
    for (name, value) in &event.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    let request = builder
        .body(Body::from(body))
        .with_context(|| format!("invalid proxy request for {}", event.path))?;

    let response = match router.oneshot(request).await {
        Ok(response) => response,
        Err(never) => match never {},
    };

    let status_code = response.status().as_u16();
    let headers: HashMap<String, String> = response
        .headers()
        .iter()
        .filter_map(|(name, value)| Some((name.to_string(), value.to_str().ok()?.to_string())))
        .collect();
    let is_text = headers
        .get(header::CONTENT_TYPE.as_str())
        .is_some_and(|ct| ct.starts_with("application/json") || ct.starts_with("text/"));

    let bytes = axum::body::to_bytes(response.into_body(), MAX_RESPONSE_BYTES)
        .await
        .context("failed to collect response body")?;
    let (body, is_base64_encoded) = match String::from_utf8(bytes.to_vec()) {
        Ok(text) if is_text || bytes.is_empty() => (text, false),
        _ => (STANDARD.encode(&bytes), true),
    };

    debug!(path = %event.path, status = status_code, "Proxy event handled");
    Ok(ProxyResponse { status_code, headers, body, is_base64_encoded })
}
