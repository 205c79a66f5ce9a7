//! Routes raw call bodies to handlers.

use std::sync::Arc;
use std::time::Instant;

use serde_json::json;
use tracing::{debug, error, Level};

use appbridge_client::ClientFactory;
use appbridge_core::{CallRequest, CallResponse};
use appbridge_logging::{redact_json, CallEvent, CallLogger};

use crate::app::{App, BINDINGS_PATH};
use crate::clock::Clock;
use crate::decode::{decode_call_request, DecodeOutcome, FallbackReason};
use crate::error::DispatchError;
use crate::handler::HandlerEnv;

/// One app's dispatcher. Cheap to clone; every clone shares the same app and
/// environment.
#[derive(Clone)]
pub struct Dispatcher {
    app: Arc<App>,
    env: HandlerEnv,
}

impl Dispatcher {
    pub fn new(app: Arc<App>, clients: Arc<dyn ClientFactory>, clock: Arc<dyn Clock>) -> Self {
        let env = HandlerEnv::new(clients, clock, app.manifest().clone());
        Self { app, env }
    }

    pub fn app(&self) -> &Arc<App> {
        &self.app
    }

    pub fn env(&self) -> &HandlerEnv {
        &self.env
    }

    /// Decode `body` and run the handler registered for `path`.
    ///
    /// Decoding never fails; see [`decode_call_request`]. Each call is handled
    /// exactly as delivered: no retry, no de-duplication.
    pub async fn dispatch(&self, path: &str, body: &[u8]) -> Result<CallResponse, DispatchError> {
        let app_id = self.app.manifest().app_id();
        let Some(handler) = self.app.routes().get(path) else {
            CallLogger::log(app_id, CallEvent::DispatchMiss { path: path.to_string() });
            return Err(DispatchError::NotFound { path: path.to_string() });
        };

        let request = self.decode(path, body);
        CallLogger::log(
            app_id,
            CallEvent::Dispatched {
                path: path.to_string(),
                hook: self.app.manifest().hook_for_path(path).map(|h| h.to_string()),
                acting_user_id: request.context.acting_user_id().to_string(),
            },
        );

        let started = Instant::now();
        let response = handler.handle(&self.env, request).await;
        CallLogger::log(
            app_id,
            CallEvent::Responded {
                path: path.to_string(),
                variant: response.variant_name().to_string(),
                elapsed_ms: started.elapsed().as_millis() as u64,
            },
        );
        Ok(response)
    }

    /// Compute the binding tree for the requesting user.
    pub fn bindings(&self, body: &[u8]) -> CallResponse {
        let request = self.decode(BINDINGS_PATH, body);
        let bindings = self.app.bindings_for(&request);
        if bindings.is_empty() {
            return CallResponse::data(json!({}));
        }
        CallResponse::data_from(&bindings).unwrap_or_else(|e| {
            error!(error = %e, "Failed to serialize bindings");
            CallResponse::error(e)
        })
    }

    fn decode(&self, path: &str, body: &[u8]) -> CallRequest {
        let (request, outcome) = decode_call_request(path, body);
        match outcome {
            DecodeOutcome::Decoded => {
                if tracing::enabled!(Level::DEBUG) {
                    if let Ok(value) = serde_json::to_value(&request) {
                        debug!(path = %path, request = %redact_json(&value), "Decoded call");
                    }
                }
            }
            DecodeOutcome::Fallback(FallbackReason::EmptyBody) => {
                debug!(path = %path, "Empty call body; using zero-value request");
            }
            DecodeOutcome::Fallback(reason) => CallLogger::log(
                self.app.manifest().app_id(),
                CallEvent::DecodeFallback { path: path.to_string(), reason: reason.to_string() },
            ),
        }
        request
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::handler::handler_fn;
    use appbridge_client::testing::RecordingClientFactory;
    use appbridge_core::{Binding, Call, LifecycleHook, Manifest};
    use chrono::{TimeZone, Utc};

    fn dispatcher(clients: RecordingClientFactory, with_bindings: bool) -> Dispatcher {
        let manifest = Manifest::builder("hello-test")
            .http_root_url("http://localhost:9000")
            .hook(LifecycleHook::OnInstall, Call::new("/install"))
            .build()
            .unwrap();

        let mut builder = App::builder(manifest)
            .route(
                "/install",
                handler_fn(|env: HandlerEnv, req: CallRequest| async move {
                    let bot = env.clients.as_bot(&req.context);
                    match bot.direct_message(req.context.acting_user_id(), "hi").await {
                        Ok(_) => CallResponse::text("sent"),
                        Err(e) => CallResponse::error(e),
                    }
                }),
            )
            .route(
                "/echo",
                handler_fn(|_, req: CallRequest| async move {
                    CallResponse::text(format!("{}:{}", req.path(), req.context.acting_user_id()))
                }),
            );
        if with_bindings {
            builder = builder.bindings(|req| {
                vec![Binding {
                    location: "/channel_header".into(),
                    label: req.context.acting_user_id().to_string(),
                    submit: Some(Call::new("/echo")),
                    ..Default::default()
                }]
            });
        }
        let app = Arc::new(builder.build().unwrap());
        let clock = FixedClock(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        Dispatcher::new(app, Arc::new(clients), Arc::new(clock))
    }

    #[tokio::test]
    async fn routes_to_handler() {
        let clients = RecordingClientFactory::new();
        let d = dispatcher(clients.clone(), false);
        let body = br#"{"path":"/install","context":{"acting_user":{"id":"u1"}}}"#;
        let response = d.dispatch("/install", body).await.unwrap();

        assert_eq!(response, CallResponse::text("sent"));
        let sent = clients.messages();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to_user_id, "u1");
    }

    #[tokio::test]
    async fn malformed_body_runs_with_zero_value_context() {
        let d = dispatcher(RecordingClientFactory::new(), false);
        let response = d.dispatch("/echo", b"{{{").await.unwrap();
        assert_eq!(response, CallResponse::text("/echo:"));
    }

    #[tokio::test]
    async fn outbound_failure_is_an_error_envelope() {
        let d = dispatcher(RecordingClientFactory::new().failing_direct_messages("boom"), false);
        let response = d.dispatch("/install", b"{}").await.unwrap();
        assert!(response.is_error());
    }

    #[tokio::test]
    async fn unknown_path_is_not_found() {
        let d = dispatcher(RecordingClientFactory::new(), false);
        let err = d.dispatch("/nope", b"{}").await.unwrap_err();
        assert!(matches!(err, DispatchError::NotFound { ref path } if path == "/nope"));
    }

    #[test]
    fn empty_bindings_are_an_empty_object() {
        let d = dispatcher(RecordingClientFactory::new(), false);
        let value = serde_json::to_value(d.bindings(b"")).unwrap();
        assert_eq!(value, json!({"type": "ok", "data": {}}));
    }

    #[test]
    fn bindings_follow_the_requesting_user() {
        let d = dispatcher(RecordingClientFactory::new(), true);
        let value =
            serde_json::to_value(d.bindings(br#"{"context":{"acting_user":{"id":"u7"}}}"#)).unwrap();
        assert_eq!(value["data"][0]["label"], "u7");
        assert_eq!(value["data"][0]["submit"]["path"], "/echo");
    }
}
