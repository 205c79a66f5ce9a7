//! Config validation with user-friendly error messages.

use crate::schema::ServerConfig;
use thiserror::Error;

/// Longest outbound timeout accepted, in seconds.
pub const MAX_OUTBOUND_TIMEOUT_SECS: u64 = 300;

/// A config validation error with field path and message.
#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

/// A collection of validation errors found in one pass.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError { path: path.into(), message: message.into() });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError { path: path.into(), message: message.into() });
    }
}

/// Validate a defaulted config and return a report of all errors and warnings.
pub fn validate(config: &ServerConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_listener(config, &mut report);
    validate_root_url(config, &mut report);
    validate_outbound(config, &mut report);
    report
}

fn validate_listener(config: &ServerConfig, report: &mut ValidationReport) {
    if config.port() == 0 {
        report.error("port", "port must be between 1 and 65535");
    } else if config.port() < 1024 {
        report.warn(
            "port",
            format!("Port {} requires elevated privileges; consider using a port >= 1024", config.port()),
        );
    }
    if config.host.as_deref().map(str::trim).unwrap_or("").is_empty() {
        report.warn("host", "No host configured; root URL falls back to localhost");
    }
}

fn validate_root_url(config: &ServerConfig, report: &mut ValidationReport) {
    let url = config.root_url();
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        report.error("rootUrl", format!("'{url}' must start with http:// or https://"));
    }
}

fn validate_outbound(config: &ServerConfig, report: &mut ValidationReport) {
    let secs = config.outbound_timeout().as_secs();
    if secs == 0 {
        report.error("outbound.timeoutSecs", "timeoutSecs must be >= 1");
    } else if secs > MAX_OUTBOUND_TIMEOUT_SECS {
        report.error(
            "outbound.timeoutSecs",
            format!("timeoutSecs must be <= {MAX_OUTBOUND_TIMEOUT_SECS}"),
        );
    }
}
