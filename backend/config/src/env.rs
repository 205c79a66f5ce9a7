//! Environment handling for config values.
//!
//! Two passes: `${VAR_NAME}` substitution inside string values of the config
//! file (only uppercase `[A-Z_][A-Z0-9_]*` names; `$${VAR}` escapes to a literal
//! `${VAR}`), and well-known variables that override individual settings.

use anyhow::{bail, Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;

use crate::schema::{DeployType, LogConfig, OutboundConfig, ServerConfig};

/// `$${NAME}` (escaped) or `${NAME}`.
static REFERENCE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$?\$\{([A-Z_][A-Z0-9_]*)\}").unwrap());

/// Error returned for missing env vars.
#[derive(Debug, thiserror::Error)]
#[error("Missing env var \"{var_name}\" referenced at config path: {config_path}")]
pub struct MissingEnvVarError {
    pub var_name: String,
    pub config_path: String,
}

/// Substitute `${VAR}` references in a config JSON value tree using the
/// process environment.
pub fn resolve_env_vars(value: &Value) -> Result<Value> {
    resolve_env_vars_with(value, &std::env::vars().collect())
}

/// Substitute env vars using a provided map.
pub fn resolve_env_vars_with(value: &Value, env: &HashMap<String, String>) -> Result<Value> {
    substitute_value(value, env, "")
}

fn substitute_value(value: &Value, env: &HashMap<String, String>, path: &str) -> Result<Value> {
    match value {
        Value::String(s) => Ok(Value::String(substitute_string(s, env, path)?)),
        Value::Array(arr) => arr
            .iter()
            .enumerate()
            .map(|(i, v)| substitute_value(v, env, &format!("{path}[{i}]")))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        Value::Object(map) => {
            let mut result = serde_json::Map::new();
            for (k, v) in map {
                let child_path = if path.is_empty() { k.clone() } else { format!("{path}.{k}") };
                result.insert(k.clone(), substitute_value(v, env, &child_path)?);
            }
            Ok(Value::Object(result))
        }
        other => Ok(other.clone()),
    }
}

fn substitute_string(s: &str, env: &HashMap<String, String>, path: &str) -> Result<String> {
    if !s.contains('$') {
        return Ok(s.to_string());
    }

    let mut missing: Option<MissingEnvVarError> = None;
    let substituted = REFERENCE_PATTERN.replace_all(s, |caps: &regex::Captures| {
        let whole = &caps[0];
        let name = &caps[1];
        if whole.starts_with("$$") {
            return format!("${{{name}}}");
        }
        match env.get(name) {
            Some(val) if !val.is_empty() => val.clone(),
            _ => {
                missing.get_or_insert_with(|| MissingEnvVarError {
                    var_name: name.to_string(),
                    config_path: path.to_string(),
                });
                String::new()
            }
        }
    });

    if let Some(err) = missing {
        bail!(err);
    }
    Ok(substituted.into_owned())
}

/// Apply the well-known override variables on top of a loaded config.
///
/// `ROOT_URL`, `APP_HOST`, `APP_PORT`, `APP_BIND`, `APPBRIDGE_LOG_LEVEL`,
/// `APPBRIDGE_LOG_DIR`, `APPBRIDGE_LOG_JSON`, `APPBRIDGE_OUTBOUND_TIMEOUT_SECS`,
/// `APPBRIDGE_DEPLOY_TYPE`. Empty values are ignored.
pub fn apply_env_overrides(
    mut config: ServerConfig,
    env: &HashMap<String, String>,
) -> Result<ServerConfig> {
    let get = |key: &str| env.get(key).filter(|v| !v.is_empty()).cloned();

    if let Some(url) = get("ROOT_URL") {
        config.root_url = Some(url);
    }
    if let Some(host) = get("APP_HOST") {
        config.host = Some(host);
    }
    if let Some(port) = get("APP_PORT") {
        let port = port
            .parse::<u16>()
            .with_context(|| format!("APP_PORT must be a port number, got '{port}'"))?;
        config.port = Some(port);
    }
    if let Some(bind) = get("APP_BIND") {
        config.bind_address = Some(bind);
    }
    if let Some(deploy) = get("APPBRIDGE_DEPLOY_TYPE") {
        config.deploy_type = Some(deploy.parse::<DeployType>().map_err(anyhow::Error::msg)?);
    }

    let log_level = get("APPBRIDGE_LOG_LEVEL");
    let log_dir = get("APPBRIDGE_LOG_DIR");
    let log_json = get("APPBRIDGE_LOG_JSON");
    if log_level.is_some() || log_dir.is_some() || log_json.is_some() {
        let log = config.log.get_or_insert_with(LogConfig::default);
        if log_level.is_some() {
            log.level = log_level;
        }
        if log_dir.is_some() {
            log.dir = log_dir;
        }
        if let Some(json) = log_json {
            log.json = Some(matches!(json.as_str(), "1" | "true" | "yes"));
        }
    }

    if let Some(secs) = get("APPBRIDGE_OUTBOUND_TIMEOUT_SECS") {
        let secs = secs.parse::<u64>().with_context(|| {
            format!("APPBRIDGE_OUTBOUND_TIMEOUT_SECS must be a number of seconds, got '{secs}'")
        })?;
        config.outbound.get_or_insert_with(OutboundConfig::default).timeout_secs = Some(secs);
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn substitutes_nested_var() {
        let v = json!({"log": {"dir": "${LOG_ROOT}/apps"}});
        let result = resolve_env_vars_with(&v, &env(&[("LOG_ROOT", "/var/log")])).unwrap();
        assert_eq!(result["log"]["dir"], "/var/log/apps");
    }

    #[test]
    fn error_on_missing_var() {
        let v = json!({"rootUrl": "${MISSING_URL}"});
        let err = resolve_env_vars_with(&v, &HashMap::new()).unwrap_err();
        assert!(err.to_string().contains("MISSING_URL"));
        assert!(err.to_string().contains("rootUrl"));
    }

    #[test]
    fn escaped_reference_is_literal() {
        let v = json!({"host": "$${NOT_A_VAR}"});
        let result = resolve_env_vars_with(&v, &HashMap::new()).unwrap();
        assert_eq!(result["host"], "${NOT_A_VAR}");
    }

    #[test]
    fn overrides_take_precedence() {
        let cfg = ServerConfig { port: Some(8085), ..Default::default() };
        let cfg = apply_env_overrides(
            cfg,
            &env(&[
                ("APP_PORT", "9001"),
                ("ROOT_URL", "https://apps.example.com"),
                ("APPBRIDGE_LOG_JSON", "true"),
                ("APP_HOST", ""),
            ]),
        )
        .unwrap();
        assert_eq!(cfg.port, Some(9001));
        assert_eq!(cfg.root_url(), "https://apps.example.com");
        assert!(cfg.log_json());
        assert_eq!(cfg.host, None);
    }

    #[test]
    fn bad_port_is_an_error() {
        let result = apply_env_overrides(ServerConfig::default(), &env(&[("APP_PORT", "http")]));
        assert!(result.is_err());
    }
}
