//! `appbridge-dispatch`: turning inbound calls into handler invocations.
//!
//! An [`App`] bundles a manifest, a binding source, static assets and an
//! explicit [`RouteTable`]. A [`Dispatcher`] pairs an app with the outbound
//! client factory and clock its handlers use, and routes raw request bodies to
//! the handler registered for a path.

pub mod app;
pub mod clock;
pub mod decode;
pub mod dispatcher;
pub mod error;
pub mod handler;
pub mod lifecycle;
pub mod routes;

pub use app::{App, AppBuilder, BindingSource, StaticAsset};
pub use clock::{Clock, FixedClock, SystemClock};
pub use decode::{decode_call_request, DecodeOutcome, FallbackReason};
pub use dispatcher::Dispatcher;
pub use error::DispatchError;
pub use handler::{handler_fn, CallHandler, HandlerEnv};
pub use lifecycle::{InvalidTransition, LifecycleState};
pub use routes::{RouteTable, RouteTableBuilder};
