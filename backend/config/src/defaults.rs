//! Config defaults: applies per-app listener defaults and global fallbacks.

use crate::schema::{DeployType, LogConfig, OutboundConfig, ServerConfig};

pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0";

pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Bound on every outbound request; the dispatcher imposes none of its own.
pub const DEFAULT_OUTBOUND_TIMEOUT_SECS: u64 = 10;

/// Where an app listens unless configured otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenDefaults {
    pub host: String,
    pub port: u16,
}

impl ListenDefaults {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self { host: host.into(), port }
    }
}

/// Apply all defaults to a loaded config.
pub fn apply_all_defaults(config: ServerConfig, listen: &ListenDefaults) -> ServerConfig {
    let config = apply_listener_defaults(config, listen);
    let config = apply_log_defaults(config);
    apply_outbound_defaults(config)
}

fn apply_listener_defaults(mut config: ServerConfig, listen: &ListenDefaults) -> ServerConfig {
    config.host.get_or_insert_with(|| listen.host.clone());
    config.port.get_or_insert(listen.port);
    config.bind_address.get_or_insert_with(|| DEFAULT_BIND_ADDRESS.to_string());
    config.deploy_type.get_or_insert(DeployType::Http);
    config
}

fn apply_log_defaults(mut config: ServerConfig) -> ServerConfig {
    let log = config.log.get_or_insert_with(LogConfig::default);
    log.level.get_or_insert_with(|| DEFAULT_LOG_LEVEL.to_string());
    log.json.get_or_insert(false);
    config
}

fn apply_outbound_defaults(mut config: ServerConfig) -> ServerConfig {
    let outbound = config.outbound.get_or_insert_with(OutboundConfig::default);
    outbound.timeout_secs.get_or_insert(DEFAULT_OUTBOUND_TIMEOUT_SECS);
    config
}
