/// App manifest: the static declaration a host reads from `/manifest.json`.
///
/// Built once through [`ManifestBuilder`] and never mutated afterwards.
use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::call::Call;
use crate::error::AppError;

// ---------------------------------------------------------------------------
// Permissions and locations
// ---------------------------------------------------------------------------

/// Capability tags the host must grant before the app may use them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    ActAsBot,
    ActAsUser,
    ActAsAdmin,
    RemoteWebhooks,
    #[serde(rename = "remote_oauth2")]
    RemoteOAuth2,
}

/// UI locations an app may bind into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Location {
    #[serde(rename = "/command")]
    Command,
    #[serde(rename = "/channel_header")]
    ChannelHeader,
    #[serde(rename = "/post_menu")]
    PostMenu,
    #[serde(rename = "/in_post")]
    InPost,
}

impl Location {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Command => "/command",
            Self::ChannelHeader => "/channel_header",
            Self::PostMenu => "/post_menu",
            Self::InPost => "/in_post",
        }
    }
}

// ---------------------------------------------------------------------------
// Deploy descriptor
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpDeploy {
    pub root_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LambdaFunction {
    pub path: String,
    pub name: String,
    pub handler: String,
    pub runtime: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LambdaDeploy {
    pub functions: Vec<LambdaFunction>,
}

/// How the host reaches the app. Flattened into the manifest document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deploy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http: Option<HttpDeploy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws_lambda: Option<LambdaDeploy>,
}

impl Deploy {
    pub fn is_empty(&self) -> bool {
        self.http.is_none() && self.aws_lambda.is_none()
    }
}

// ---------------------------------------------------------------------------
// Lifecycle hooks
// ---------------------------------------------------------------------------

/// The five host-issued lifecycle notifications an app can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleHook {
    OnInstall,
    OnVersionChanged,
    OnUninstall,
    OnEnable,
    OnDisable,
}

impl LifecycleHook {
    pub const ALL: [LifecycleHook; 5] = [
        Self::OnInstall,
        Self::OnVersionChanged,
        Self::OnUninstall,
        Self::OnEnable,
        Self::OnDisable,
    ];

    pub fn manifest_key(&self) -> &'static str {
        match self {
            Self::OnInstall => "on_install",
            Self::OnVersionChanged => "on_version_changed",
            Self::OnUninstall => "on_uninstall",
            Self::OnEnable => "on_enable",
            Self::OnDisable => "on_disable",
        }
    }
}

impl std::fmt::Display for LifecycleHook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.manifest_key())
    }
}

// ---------------------------------------------------------------------------
// Manifest
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    app_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    version: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    homepage_url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    display_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    icon: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    requested_permissions: Vec<Permission>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    requested_locations: Vec<Location>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    on_install: Option<Call>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    on_version_changed: Option<Call>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    on_uninstall: Option<Call>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    on_enable: Option<Call>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    on_disable: Option<Call>,
    /// Call the host makes to fetch the binding tree.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    bindings: Option<Call>,
    #[serde(flatten)]
    deploy: Deploy,
}

impl Manifest {
    pub fn builder(app_id: impl Into<String>) -> ManifestBuilder {
        ManifestBuilder::new(app_id)
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn homepage_url(&self) -> &str {
        &self.homepage_url
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn icon(&self) -> &str {
        &self.icon
    }

    pub fn requested_permissions(&self) -> &[Permission] {
        &self.requested_permissions
    }

    pub fn requested_locations(&self) -> &[Location] {
        &self.requested_locations
    }

    pub fn deploy(&self) -> &Deploy {
        &self.deploy
    }

    pub fn bindings_call(&self) -> Option<&Call> {
        self.bindings.as_ref()
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        self.requested_permissions.contains(&permission)
    }

    pub fn hook(&self, hook: LifecycleHook) -> Option<&Call> {
        match hook {
            LifecycleHook::OnInstall => self.on_install.as_ref(),
            LifecycleHook::OnVersionChanged => self.on_version_changed.as_ref(),
            LifecycleHook::OnUninstall => self.on_uninstall.as_ref(),
            LifecycleHook::OnEnable => self.on_enable.as_ref(),
            LifecycleHook::OnDisable => self.on_disable.as_ref(),
        }
    }

    /// Declared hooks in their canonical order.
    pub fn lifecycle_hooks(&self) -> impl Iterator<Item = (LifecycleHook, &Call)> {
        LifecycleHook::ALL
            .into_iter()
            .filter_map(move |hook| self.hook(hook).map(|call| (hook, call)))
    }

    /// The hook whose call is routed to `path`, if any.
    pub fn hook_for_path(&self, path: &str) -> Option<LifecycleHook> {
        self.lifecycle_hooks()
            .find(|(_, call)| call.path == path)
            .map(|(hook, _)| hook)
    }

    /// The host fires `on_version_changed` when the version it stored at install
    /// time differs from the one declared here. Unparseable versions compare
    /// by their `v`-stripped text.
    pub fn is_version_change_from(&self, previous: &str) -> bool {
        match compare_versions(previous, &self.version) {
            Ok(ordering) => ordering != Ordering::Equal,
            Err(_) => strip_v(previous) != strip_v(&self.version),
        }
    }
}

/// Fluent constructor; `build` validates and freezes the manifest.
#[derive(Debug, Clone)]
pub struct ManifestBuilder {
    inner: Manifest,
}

impl ManifestBuilder {
    fn new(app_id: impl Into<String>) -> Self {
        Self {
            inner: Manifest {
                app_id: app_id.into(),
                version: String::new(),
                homepage_url: String::new(),
                display_name: String::new(),
                description: String::new(),
                icon: String::new(),
                requested_permissions: Vec::new(),
                requested_locations: Vec::new(),
                on_install: None,
                on_version_changed: None,
                on_uninstall: None,
                on_enable: None,
                on_disable: None,
                bindings: None,
                deploy: Deploy::default(),
            },
        }
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.inner.version = version.into();
        self
    }

    pub fn display_name(mut self, name: impl Into<String>) -> Self {
        self.inner.display_name = name.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.inner.description = description.into();
        self
    }

    pub fn homepage_url(mut self, url: impl Into<String>) -> Self {
        self.inner.homepage_url = url.into();
        self
    }

    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.inner.icon = icon.into();
        self
    }

    pub fn permission(mut self, permission: Permission) -> Self {
        if !self.inner.requested_permissions.contains(&permission) {
            self.inner.requested_permissions.push(permission);
        }
        self
    }

    pub fn location(mut self, location: Location) -> Self {
        if !self.inner.requested_locations.contains(&location) {
            self.inner.requested_locations.push(location);
        }
        self
    }

    pub fn http_root_url(mut self, root_url: impl Into<String>) -> Self {
        self.inner.deploy.http = Some(HttpDeploy { root_url: root_url.into() });
        self
    }

    pub fn aws_lambda(mut self, function: LambdaFunction) -> Self {
        self.inner
            .deploy
            .aws_lambda
            .get_or_insert_with(|| LambdaDeploy { functions: Vec::new() })
            .functions
            .push(function);
        self
    }

    pub fn hook(mut self, hook: LifecycleHook, call: Call) -> Self {
        let slot = match hook {
            LifecycleHook::OnInstall => &mut self.inner.on_install,
            LifecycleHook::OnVersionChanged => &mut self.inner.on_version_changed,
            LifecycleHook::OnUninstall => &mut self.inner.on_uninstall,
            LifecycleHook::OnEnable => &mut self.inner.on_enable,
            LifecycleHook::OnDisable => &mut self.inner.on_disable,
        };
        *slot = Some(call);
        self
    }

    pub fn bindings_call(mut self, call: Call) -> Self {
        self.inner.bindings = Some(call);
        self
    }

    pub fn build(self) -> Result<Manifest, AppError> {
        let m = self.inner;
        validate_app_id(&m.app_id)?;
        if !m.version.is_empty() {
            parse_version(&m.version)?;
        }
        if m.deploy.is_empty() {
            return Err(AppError::InvalidManifest(format!(
                "app `{}` declares no deploy descriptor",
                m.app_id
            )));
        }
        if let Some(http) = &m.deploy.http {
            if !(http.root_url.starts_with("http://") || http.root_url.starts_with("https://")) {
                return Err(AppError::InvalidManifest(format!(
                    "root_url `{}` must be an http(s) URL",
                    http.root_url
                )));
            }
        }
        for (hook, call) in m.lifecycle_hooks() {
            if !call.path.starts_with('/') {
                return Err(AppError::InvalidManifest(format!(
                    "{hook} path `{}` must start with '/'",
                    call.path
                )));
            }
        }
        Ok(m)
    }
}

fn validate_app_id(app_id: &str) -> Result<(), AppError> {
    if app_id.len() < 3 || app_id.len() > 32 {
        return Err(AppError::InvalidManifest(format!(
            "app_id `{app_id}` must be 3 to 32 characters"
        )));
    }
    let ok = app_id
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '-' | '_' | '.'));
    if !ok {
        return Err(AppError::InvalidManifest(format!(
            "app_id `{app_id}` may only contain a-z, 0-9, '-', '_' and '.'"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Versions
// ---------------------------------------------------------------------------

fn strip_v(version: &str) -> &str {
    let version = version.trim();
    version.strip_prefix('v').unwrap_or(version)
}

/// Parse a semantic version, stripping an optional `v` prefix.
pub fn parse_version(version: &str) -> Result<semver::Version, AppError> {
    semver::Version::parse(strip_v(version))
        .map_err(|e| AppError::InvalidManifest(format!("version `{version}` is not semantic: {e}")))
}

/// Order two `v`-optional semantic versions; pre-releases sort before their release.
pub fn compare_versions(a: &str, b: &str) -> Result<Ordering, AppError> {
    Ok(parse_version(a)?.cmp(&parse_version(b)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::call::{Expand, ExpandLevel};

    fn sample() -> Manifest {
        let expand = Expand { acting_user: Some(ExpandLevel::Id), ..Default::default() };
        let mut builder = Manifest::builder("hello-lifecycle")
            .version("v1.2.0")
            .display_name("Hello, Lifecycle!")
            .icon("icon.png")
            .permission(Permission::ActAsBot)
            .permission(Permission::ActAsBot)
            .http_root_url("http://localhost:8083");
        for (hook, path) in [
            (LifecycleHook::OnInstall, "/install"),
            (LifecycleHook::OnVersionChanged, "/version_changed"),
            (LifecycleHook::OnUninstall, "/uninstall"),
            (LifecycleHook::OnEnable, "/enable"),
            (LifecycleHook::OnDisable, "/disable"),
        ] {
            builder = builder.hook(hook, Call::new(path).with_expand(expand.clone()));
        }
        builder.build().unwrap()
    }

    #[test]
    fn manifest_json_roundtrip_keeps_identity_and_hooks() {
        let manifest = sample();
        let json = serde_json::to_string(&manifest).unwrap();
        let decoded: Manifest = serde_json::from_str(&json).unwrap();

        assert_eq!(decoded.app_id(), "hello-lifecycle");
        assert_eq!(decoded.version(), "v1.2.0");
        assert_eq!(decoded.requested_permissions(), &[Permission::ActAsBot]);
        let paths: Vec<_> = decoded.lifecycle_hooks().map(|(_, c)| c.path.clone()).collect();
        assert_eq!(
            paths,
            vec!["/install", "/version_changed", "/uninstall", "/enable", "/disable"]
        );
        assert_eq!(decoded, manifest);
    }

    #[test]
    fn deploy_is_flattened() {
        let value = serde_json::to_value(sample()).unwrap();
        assert_eq!(value["http"]["root_url"], "http://localhost:8083");
        assert_eq!(value["requested_permissions"][0], "act_as_bot");
        assert_eq!(value["on_install"]["expand"]["acting_user"], "id");
        assert!(value.get("deploy").is_none());
    }

    #[test]
    fn rejects_bad_app_id_and_missing_deploy() {
        assert!(Manifest::builder("Hello World").http_root_url("http://x").build().is_err());
        assert!(Manifest::builder("hello").build().is_err());
        assert!(Manifest::builder("hello").http_root_url("ftp://x").build().is_err());
    }

    #[test]
    fn rejects_relative_hook_path() {
        let err = Manifest::builder("hello")
            .http_root_url("http://localhost:1")
            .hook(LifecycleHook::OnInstall, Call::new("install"))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("on_install"));
    }

    #[test]
    fn version_comparison() {
        assert_eq!(compare_versions("v1.2.0", "1.2.0").unwrap(), Ordering::Equal);
        assert_eq!(compare_versions("v1.1.0", "v1.2.0").unwrap(), Ordering::Less);
        assert_eq!(compare_versions("v1.10.0", "v1.9.9").unwrap(), Ordering::Greater);
        assert!(compare_versions("1.2", "1.2.0").is_err());
        assert!(sample().is_version_change_from("v1.1.0"));
        assert!(!sample().is_version_change_from("1.2.0"));
        assert!(sample().is_version_change_from("not-a-version"));
    }

    #[test]
    fn pre_release_sorts_before_release() {
        assert_eq!(compare_versions("v1.2.0-rc.1", "v1.2.0").unwrap(), Ordering::Less);
        assert_eq!(compare_versions("v1.2.0-rc.2", "v1.2.0-rc.10").unwrap(), Ordering::Less);
        assert!(sample().is_version_change_from("v1.2.0-rc.1"));
    }

    #[test]
    fn rejects_non_semantic_version() {
        let err = Manifest::builder("hello")
            .version("v1.2")
            .http_root_url("http://localhost:1")
            .build()
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidManifest(_)));
        assert!(err.to_string().contains("v1.2"));
    }

    #[test]
    fn permission_lookup() {
        let manifest = sample();
        assert!(manifest.has_permission(Permission::ActAsBot));
        assert!(!manifest.has_permission(Permission::ActAsUser));
    }
}
