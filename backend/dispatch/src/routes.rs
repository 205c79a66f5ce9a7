//! Explicit path → handler table.
//!
//! Built once at startup and shared read-only; nothing is registered through
//! global state, so several apps can live in one process.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use crate::handler::CallHandler;

#[derive(Default)]
pub struct RouteTableBuilder {
    routes: BTreeMap<String, Arc<dyn CallHandler>>,
}

impl RouteTableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `path`. A later registration for the same path
    /// replaces the earlier one.
    pub fn route(mut self, path: impl Into<String>, handler: Arc<dyn CallHandler>) -> Self {
        let path = path.into();
        if self.routes.insert(path.clone(), handler).is_some() {
            debug!(path = %path, "Replacing call handler");
        }
        self
    }

    pub fn build(self) -> RouteTable {
        RouteTable { routes: self.routes }
    }
}

pub struct RouteTable {
    routes: BTreeMap<String, Arc<dyn CallHandler>>,
}

impl RouteTable {
    pub fn builder() -> RouteTableBuilder {
        RouteTableBuilder::new()
    }

    pub fn get(&self, path: &str) -> Option<Arc<dyn CallHandler>> {
        self.routes.get(path).cloned()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.routes.contains_key(path)
    }

    /// Registered paths in sorted order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.routes.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::handler_fn;
    use appbridge_core::CallResponse;

    #[test]
    fn lookup_is_exact() {
        let table = RouteTable::builder()
            .route("/ping", handler_fn(|_, _| async { CallResponse::text("pong") }))
            .route("/install", handler_fn(|_, _| async { CallResponse::text("") }))
            .build();

        assert!(table.contains("/ping"));
        assert!(table.get("/ping/").is_none());
        assert!(table.get("/PING").is_none());
        assert_eq!(table.paths().collect::<Vec<_>>(), vec!["/install", "/ping"]);
    }
}
