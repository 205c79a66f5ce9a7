//! Call handlers and the environment they run in.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use appbridge_client::ClientFactory;
use appbridge_core::{CallRequest, CallResponse, Manifest};
use appbridge_logging::{CallEvent, CallLogger};

use crate::clock::Clock;

/// Shared, read-only dependencies handed to every handler invocation.
#[derive(Clone)]
pub struct HandlerEnv {
    pub clients: Arc<dyn ClientFactory>,
    pub clock: Arc<dyn Clock>,
    pub manifest: Arc<Manifest>,
}

impl HandlerEnv {
    pub fn new(
        clients: Arc<dyn ClientFactory>,
        clock: Arc<dyn Clock>,
        manifest: Arc<Manifest>,
    ) -> Self {
        Self { clients, clock, manifest }
    }

    /// Record an outbound request that failed while handling `path`.
    pub fn outbound_failed(&self, path: &str, error: &dyn fmt::Display) {
        CallLogger::log(
            self.manifest.app_id(),
            CallEvent::OutboundFailed { path: path.to_string(), error: error.to_string() },
        );
    }
}

/// Handles the calls routed to one path.
///
/// A handler runs to completion and yields exactly one response; failures are
/// returned as [`CallResponse::Error`] rather than propagated. Handlers must not
/// keep mutable state between invocations.
///
/// Handlers bound to a timer's call are fired by the host at least once and
/// possibly more, with whatever context the timer's expand asked for. They must
/// be idempotent and must not depend on the request that created the timer.
#[async_trait]
pub trait CallHandler: Send + Sync {
    async fn handle(&self, env: &HandlerEnv, request: CallRequest) -> CallResponse;
}

struct FnHandler<F>(F);

#[async_trait]
impl<F, Fut> CallHandler for FnHandler<F>
where
    F: Fn(HandlerEnv, CallRequest) -> Fut + Send + Sync,
    Fut: Future<Output = CallResponse> + Send + 'static,
{
    async fn handle(&self, env: &HandlerEnv, request: CallRequest) -> CallResponse {
        (self.0)(env.clone(), request).await
    }
}

/// Adapt an async function or closure into a [`CallHandler`].
pub fn handler_fn<F, Fut>(f: F) -> Arc<dyn CallHandler>
where
    F: Fn(HandlerEnv, CallRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = CallResponse> + Send + 'static,
{
    Arc::new(FnHandler(f))
}
