//! App definition: everything the gateway serves for one app.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::info;

use appbridge_core::{collect_call_paths, AppError, Binding, CallRequest, Manifest};

use crate::handler::CallHandler;
use crate::routes::{RouteTable, RouteTableBuilder};

/// Path the host calls to fetch an app's bindings.
pub const BINDINGS_PATH: &str = "/bindings";

/// Computes the binding tree for one request, so bindings may vary per user
/// or channel.
pub type BindingSource = Arc<dyn Fn(&CallRequest) -> Vec<Binding> + Send + Sync>;

/// A file compiled into the binary and served under `/static/`.
#[derive(Debug, Clone, Copy)]
pub struct StaticAsset {
    pub content_type: &'static str,
    pub bytes: &'static [u8],
}

pub struct App {
    manifest: Arc<Manifest>,
    manifest_json: String,
    bindings: BindingSource,
    routes: RouteTable,
    assets: HashMap<String, StaticAsset>,
}

impl fmt::Debug for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("App")
            .field("app_id", &self.manifest.app_id())
            .field("routes", &self.routes.paths().collect::<Vec<_>>())
            .field("assets", &self.assets.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl App {
    pub fn builder(manifest: Manifest) -> AppBuilder {
        AppBuilder {
            manifest,
            bindings: None,
            routes: RouteTableBuilder::new(),
            assets: HashMap::new(),
        }
    }

    pub fn manifest(&self) -> &Arc<Manifest> {
        &self.manifest
    }

    /// The manifest as served at `/manifest.json`, rendered once at build time.
    pub fn manifest_json(&self) -> &str {
        &self.manifest_json
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn asset(&self, name: &str) -> Option<&StaticAsset> {
        self.assets.get(name)
    }

    pub fn bindings_for(&self, request: &CallRequest) -> Vec<Binding> {
        (self.bindings)(request)
    }

    /// Check that every call the app advertises has a handler and that every
    /// form is well-formed. Bindings are evaluated against an empty request.
    pub fn validate(&self) -> Result<(), AppError> {
        for (hook, call) in self.manifest.lifecycle_hooks() {
            self.require_route(&call.path, || format!("manifest {hook}"))?;
        }

        if let Some(call) = self.manifest.bindings_call() {
            if call.path != BINDINGS_PATH {
                self.require_route(&call.path, || "manifest bindings".to_string())?;
            }
        }

        let icon = self.manifest.icon();
        if !icon.is_empty() && !self.assets.contains_key(icon) {
            return Err(AppError::InvalidManifest(format!(
                "icon `{icon}` is not a bundled static asset"
            )));
        }

        let bindings = self.bindings_for(&CallRequest::default());
        for binding in &bindings {
            binding.validate_forms()?;
        }
        for path in collect_call_paths(&bindings) {
            self.require_route(&path, || "bindings".to_string())?;
        }
        Ok(())
    }

    fn require_route(&self, path: &str, referrer: impl FnOnce() -> String) -> Result<(), AppError> {
        if self.routes.contains(path) {
            Ok(())
        } else {
            Err(AppError::DanglingCall { path: path.to_string(), referrer: referrer() })
        }
    }
}

fn no_bindings() -> BindingSource {
    Arc::new(|_: &CallRequest| Vec::new())
}

pub struct AppBuilder {
    manifest: Manifest,
    bindings: Option<BindingSource>,
    routes: RouteTableBuilder,
    assets: HashMap<String, StaticAsset>,
}

impl AppBuilder {
    pub fn route(mut self, path: impl Into<String>, handler: Arc<dyn CallHandler>) -> Self {
        self.routes = self.routes.route(path, handler);
        self
    }

    pub fn bindings<F>(mut self, source: F) -> Self
    where
        F: Fn(&CallRequest) -> Vec<Binding> + Send + Sync + 'static,
    {
        self.bindings = Some(Arc::new(source));
        self
    }

    pub fn asset(mut self, name: impl Into<String>, content_type: &'static str, bytes: &'static [u8]) -> Self {
        self.assets.insert(name.into(), StaticAsset { content_type, bytes });
        self
    }

    /// Freeze the app, rendering the manifest and validating every reference.
    pub fn build(self) -> Result<App, AppError> {
        let manifest_json = serde_json::to_string(&self.manifest)?;
        let app = App {
            manifest: Arc::new(self.manifest),
            manifest_json,
            bindings: self.bindings.unwrap_or_else(no_bindings),
            routes: self.routes.build(),
            assets: self.assets,
        };
        app.validate()?;
        info!(
            app_id = %app.manifest.app_id(),
            version = %app.manifest.version(),
            routes = app.routes.len(),
            "App ready"
        );
        Ok(app)
    }
}
