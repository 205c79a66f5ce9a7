//! appbridge Gateway HTTP Server
//!
//! Serves an app's manifest, static assets and bindings, and routes every other
//! path to the app's call dispatcher. The same router also backs the
//! function-invocation deploy variant in [`serverless`].

pub mod handlers;
pub mod server;
pub mod serverless;

pub use server::{router, start_server, GatewayState};
pub use serverless::{invoke, ProxyRequest, ProxyResponse};
