//! appbridge server configuration schema.
//!
//! Every field is optional in file form; [`crate::defaults`] fills the gaps and
//! the accessors below read the resolved values.

use serde::{Deserialize, Serialize};

use crate::defaults::{
    DEFAULT_BIND_ADDRESS, DEFAULT_LOG_LEVEL, DEFAULT_OUTBOUND_TIMEOUT_SECS,
};

/// How the host reaches the app.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeployType {
    /// Long-running HTTP listener.
    #[default]
    Http,
    /// Same routes behind a function-invocation proxy.
    AwsLambda,
}

impl std::str::FromStr for DeployType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "http" => Ok(Self::Http),
            "aws_lambda" => Ok(Self::AwsLambda),
            other => Err(format!("unknown deploy type '{other}'. Use 'http' or 'aws_lambda'")),
        }
    }
}

/// Root configuration for one app process.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    /// Hostname the host uses to reach this app
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    /// Listener port
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    /// Listener bind address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bind_address: Option<String>,

    /// Root URL advertised in the manifest deploy descriptor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deploy_type: Option<DeployType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log: Option<LogConfig>,

    /// Outbound client settings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outbound: Option<OutboundConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    /// Directory for rolling NDJSON log files
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboundConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl ServerConfig {
    pub fn host(&self) -> &str {
        self.host.as_deref().unwrap_or("localhost")
    }

    pub fn port(&self) -> u16 {
        self.port.unwrap_or_default()
    }

    pub fn bind_address(&self) -> &str {
        self.bind_address.as_deref().unwrap_or(DEFAULT_BIND_ADDRESS)
    }

    /// Address the listener binds, e.g. `0.0.0.0:8085`.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_address(), self.port())
    }

    /// Configured root URL, else `http://{host}:{port}`.
    pub fn root_url(&self) -> String {
        match &self.root_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("http://{}:{}", self.host(), self.port()),
        }
    }

    pub fn deploy_type(&self) -> DeployType {
        self.deploy_type.unwrap_or_default()
    }

    pub fn log_level(&self) -> &str {
        self.log
            .as_ref()
            .and_then(|l| l.level.as_deref())
            .unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn log_dir(&self) -> Option<&str> {
        self.log.as_ref().and_then(|l| l.dir.as_deref())
    }

    pub fn log_json(&self) -> bool {
        self.log.as_ref().and_then(|l| l.json).unwrap_or(false)
    }

    pub fn outbound_timeout(&self) -> std::time::Duration {
        let secs = self
            .outbound
            .as_ref()
            .and_then(|o| o.timeout_secs)
            .unwrap_or(DEFAULT_OUTBOUND_TIMEOUT_SECS);
        std::time::Duration::from_secs(secs)
    }
}
