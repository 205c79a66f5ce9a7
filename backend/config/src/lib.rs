//! `appbridge-config`: runtime configuration for an app process.
//!
//! Provides:
//! - Typed config schema (listener, root URL, deploy type, logging, outbound client)
//! - YAML loading
//! - `${ENV_VAR}` substitution and well-known env overrides
//! - Per-app default values
//! - Validation

pub mod defaults;
pub mod env;
pub mod io;
pub mod schema;
pub mod validation;

pub use defaults::{apply_all_defaults, ListenDefaults};
pub use env::{apply_env_overrides, resolve_env_vars, resolve_env_vars_with, MissingEnvVarError};
pub use io::load_config;
pub use schema::{DeployType, LogConfig, OutboundConfig, ServerConfig};
pub use validation::{validate, ConfigValidationError, ValidationReport};

use anyhow::{bail, Context, Result};
use std::collections::HashMap;
use std::path::Path;

/// A validated config plus the warnings validation raised for it.
#[derive(Debug)]
pub struct PreparedConfig {
    pub config: ServerConfig,
    pub warnings: Vec<ConfigValidationError>,
}

impl PreparedConfig {
    pub fn new(config: ServerConfig) -> Self {
        let warnings = validate(&config).warnings;
        Self { config, warnings }
    }

    /// Emit the warnings. Call after the subscriber is installed.
    pub fn log_warnings(&self) {
        for warning in &self.warnings {
            tracing::warn!(path = %warning.path, message = %warning.message, "Config warning");
        }
    }
}

/// Load, substitute env vars, apply overrides and defaults, and validate.
///
/// This is the main entry point for loading a config at startup. `path` may be
/// `None` to run purely on environment and defaults. Warnings are returned
/// rather than logged since this usually runs before logging is set up.
pub async fn load_and_prepare(
    path: Option<&Path>,
    listen: &ListenDefaults,
) -> Result<PreparedConfig> {
    let env: HashMap<String, String> = std::env::vars().collect();
    prepare(load_raw(path).await?, listen, &env)
}

async fn load_raw(path: Option<&Path>) -> Result<ServerConfig> {
    match path {
        Some(path) => load_config(path).await,
        None => Ok(ServerConfig::default()),
    }
}

/// The pure part of [`load_and_prepare`].
pub fn prepare(
    raw: ServerConfig,
    listen: &ListenDefaults,
    env: &HashMap<String, String>,
) -> Result<PreparedConfig> {
    let value = serde_json::to_value(&raw).context("Failed to serialize config for processing")?;
    let value = resolve_env_vars_with(&value, env).context("Failed to resolve env vars in config")?;
    let config: ServerConfig =
        serde_json::from_value(value).context("Failed to deserialize config after processing")?;

    let config = apply_env_overrides(config, env)?;
    let config = apply_all_defaults(config, listen);

    let report = validate(&config);
    if !report.is_valid() {
        let errors: Vec<String> = report.errors.iter().map(ToString::to_string).collect();
        bail!("invalid configuration ({} errors): {}", errors.len(), errors.join("; "));
    }

    Ok(PreparedConfig { config, warnings: report.warnings })
}
