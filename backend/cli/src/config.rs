//! Per-command configuration: config file, environment and flags.

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};

use appbridge_apps::{DeployTarget, ExampleApp};
use appbridge_config::{
    load_and_prepare, validate, DeployType, ListenDefaults, PreparedConfig, ServerConfig,
};
use appbridge_logging::LoggerOptions;

/// Load the configuration for `app`, applying a `--port` flag last.
pub async fn load(app: ExampleApp, path: Option<&Path>, port: Option<u16>) -> Result<PreparedConfig> {
    let listen = ListenDefaults::new(app.default_host(), app.default_port());
    let prepared = load_and_prepare(path, &listen).await?;
    match port {
        Some(port) => with_port(prepared.config, port),
        None => Ok(prepared),
    }
}

fn with_port(mut config: ServerConfig, port: u16) -> Result<PreparedConfig> {
    config.port = Some(port);
    if let Some(first) = validate(&config).errors.first() {
        bail!("invalid --port: {first}");
    }
    Ok(PreparedConfig::new(config))
}

pub fn deploy_target(config: &ServerConfig) -> DeployTarget {
    match config.deploy_type() {
        DeployType::Http => DeployTarget::http(config.root_url()),
        DeployType::AwsLambda => DeployTarget::AwsLambda,
    }
}

/// `serve` only makes sense for apps whose manifest advertises an HTTP root URL.
pub fn ensure_http(config: &ServerConfig) -> Result<()> {
    if config.deploy_type() == DeployType::AwsLambda {
        bail!(
            "deployType is aws_lambda, so the manifest advertises a function rather than a URL; \
             use `appbridge invoke` to handle events"
        );
    }
    Ok(())
}

/// Logger settings; `stderr` keeps stdout clean for commands that print data.
pub fn logger_options(config: &ServerConfig, stderr: bool) -> LoggerOptions {
    LoggerOptions {
        level: config.log_level().to_string(),
        log_dir: config.log_dir().map(PathBuf::from),
        json: config.log_json(),
        stderr,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use appbridge_config::apply_all_defaults;

    fn defaulted(config: ServerConfig) -> ServerConfig {
        apply_all_defaults(config, &ListenDefaults::new("hello", 8085))
    }

    #[test]
    fn serve_is_refused_for_lambda_deploys() {
        let lambda = defaulted(ServerConfig {
            deploy_type: Some(DeployType::AwsLambda),
            ..Default::default()
        });
        let err = ensure_http(&lambda).unwrap_err();
        assert!(err.to_string().contains("appbridge invoke"));
        assert!(matches!(deploy_target(&lambda), DeployTarget::AwsLambda));

        assert!(ensure_http(&defaulted(ServerConfig::default())).is_ok());
    }

    #[test]
    fn port_flag_is_validated_and_rewarned() {
        assert!(with_port(defaulted(ServerConfig::default()), 0).is_err());

        let prepared = with_port(defaulted(ServerConfig::default()), 80).unwrap();
        assert_eq!(prepared.config.port(), 80);
        assert!(prepared.warnings.iter().any(|w| w.path == "port"));
    }
}
