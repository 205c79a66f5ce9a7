//! `appbridge-apps`: the bundled example apps.
//!
//! Each app module exposes its manifest, its binding tree and an `app`
//! constructor that wires its handlers into an [`App`].

use std::fmt;

use appbridge_core::{AppError, LambdaFunction, ManifestBuilder};
use appbridge_dispatch::{App, AppBuilder};

pub mod dynamic_form;
pub mod lifecycle;
pub mod timers;

/// Name of the icon every app ships, relative to `/static/`.
pub const ICON: &str = "icon.png";

static ICON_PNG: &[u8] = include_bytes!("../static/icon.png");

/// How the host is told to reach an app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployTarget {
    Http { root_url: String },
    /// All routes behind one function; see `appbridge_gateway::serverless`.
    AwsLambda,
}

impl DeployTarget {
    pub fn http(root_url: impl Into<String>) -> Self {
        Self::Http { root_url: root_url.into() }
    }

    fn describe(&self, builder: ManifestBuilder, app_id: &str) -> ManifestBuilder {
        match self {
            Self::Http { root_url } => builder.http_root_url(root_url.as_str()),
            Self::AwsLambda => builder.aws_lambda(LambdaFunction {
                path: "/".to_string(),
                name: app_id.to_string(),
                handler: "bootstrap".to_string(),
                runtime: "provided.al2".to_string(),
            }),
        }
    }
}

fn with_icon(builder: AppBuilder) -> AppBuilder {
    builder.asset(ICON, "image/png", ICON_PNG)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExampleApp {
    Lifecycle,
    Timers,
    DynamicForm,
}

impl ExampleApp {
    pub const ALL: [ExampleApp; 3] = [Self::Lifecycle, Self::Timers, Self::DynamicForm];

    pub fn app_id(self) -> &'static str {
        match self {
            Self::Lifecycle => lifecycle::APP_ID,
            Self::Timers => timers::APP_ID,
            Self::DynamicForm => dynamic_form::APP_ID,
        }
    }

    /// Hostname the host uses to reach the app unless configured otherwise.
    pub fn default_host(self) -> &'static str {
        match self {
            Self::Lifecycle => lifecycle::HOST,
            Self::Timers => timers::HOST,
            Self::DynamicForm => dynamic_form::HOST,
        }
    }

    pub fn default_port(self) -> u16 {
        match self {
            Self::Lifecycle => lifecycle::PORT,
            Self::Timers => timers::PORT,
            Self::DynamicForm => dynamic_form::PORT,
        }
    }

    pub fn build(self, deploy: &DeployTarget) -> Result<App, AppError> {
        match self {
            Self::Lifecycle => lifecycle::app(deploy),
            Self::Timers => timers::app(deploy),
            Self::DynamicForm => dynamic_form::app(deploy),
        }
    }
}

impl fmt::Display for ExampleApp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.app_id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use appbridge_core::collect_call_paths;
    use appbridge_core::CallRequest;

    #[test]
    fn every_app_builds_without_dangling_paths() {
        for kind in ExampleApp::ALL {
            let app = kind
                .build(&DeployTarget::http(format!("http://localhost:{}", kind.default_port())))
                .unwrap();
            for path in collect_call_paths(&app.bindings_for(&CallRequest::default())) {
                assert!(app.routes().contains(&path), "{kind}: {path} is not routed");
            }
            for (_, call) in app.manifest().lifecycle_hooks() {
                assert!(app.routes().contains(&call.path), "{kind}: {} is not routed", call.path);
            }
            assert!(app.asset(ICON).is_some());
        }
    }

    #[test]
    fn lambda_deploy_replaces_root_url() {
        let app = ExampleApp::Timers.build(&DeployTarget::AwsLambda).unwrap();
        let manifest: serde_json::Value = serde_json::from_str(app.manifest_json()).unwrap();
        assert!(manifest.get("http").is_none());
        assert_eq!(manifest["aws_lambda"]["functions"][0]["name"], "hello-timer");
    }

    #[test]
    fn icon_is_a_png() {
        assert!(ICON_PNG.starts_with(b"\x89PNG\r\n\x1a\n"));
    }
}
