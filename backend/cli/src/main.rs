mod check_cmd;
mod config;
mod invoke_cmd;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;

use appbridge_apps::ExampleApp;
use appbridge_client::HttpClientFactory;
use appbridge_config::ServerConfig;
use appbridge_dispatch::{Dispatcher, SystemClock};
use appbridge_logging::init_logger;

#[derive(Parser)]
#[command(name = "appbridge")]
#[command(about = "appbridge: serve chat-platform apps over HTTP or as a function")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum AppName {
    /// hello-lifecycle
    Lifecycle,
    /// hello-timer
    Timers,
    /// dynamic-hello-world
    DynamicForm,
}

impl From<AppName> for ExampleApp {
    fn from(name: AppName) -> Self {
        match name {
            AppName::Lifecycle => ExampleApp::Lifecycle,
            AppName::Timers => ExampleApp::Timers,
            AppName::DynamicForm => ExampleApp::DynamicForm,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Serve an app over HTTP
    Serve {
        #[arg(value_enum)]
        app: AppName,
        /// Port to bind the HTTP server to
        #[arg(short, long)]
        port: Option<u16>,
        /// YAML config file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Print an app's manifest
    Manifest {
        #[arg(value_enum)]
        app: AppName,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Validate an app definition and its configuration
    Check {
        #[arg(value_enum)]
        app: AppName,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Handle one serverless proxy event read from stdin
    Invoke {
        #[arg(value_enum)]
        app: AppName,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { app, port, config } => {
            let kind = ExampleApp::from(app);
            let config = setup(kind, config.as_deref(), port, false).await?;
            config::ensure_http(&config)?;
            run_server(kind, config).await?;
        }
        Commands::Manifest { app, config } => {
            let kind = ExampleApp::from(app);
            let config = setup(kind, config.as_deref(), None, true).await?;
            let app = kind.build(&config::deploy_target(&config))?;
            let manifest: serde_json::Value = serde_json::from_str(app.manifest_json())?;
            println!("{}", serde_json::to_string_pretty(&manifest)?);
        }
        Commands::Check { app, config } => {
            let kind = ExampleApp::from(app);
            let prepared = config::load(kind, config.as_deref(), None).await?;
            init_logger(&config::logger_options(&prepared.config, true));
            check_cmd::run(kind, &prepared)?;
        }
        Commands::Invoke { app, config } => {
            let kind = ExampleApp::from(app);
            let config = setup(kind, config.as_deref(), None, true).await?;
            invoke_cmd::run(dispatcher(kind, &config)?).await?;
        }
    }

    Ok(())
}

/// Load config, install the subscriber, then surface config warnings through it.
async fn setup(
    kind: ExampleApp,
    path: Option<&Path>,
    port: Option<u16>,
    stderr: bool,
) -> Result<ServerConfig> {
    let prepared = config::load(kind, path, port).await?;
    init_logger(&config::logger_options(&prepared.config, stderr));
    prepared.log_warnings();
    Ok(prepared.config)
}

fn dispatcher(kind: ExampleApp, config: &ServerConfig) -> Result<Dispatcher> {
    let app = kind
        .build(&config::deploy_target(config))
        .with_context(|| format!("{kind} is misconfigured"))?;
    let clients = HttpClientFactory::new(config.outbound_timeout())?;
    Ok(Dispatcher::new(Arc::new(app), Arc::new(clients), Arc::new(SystemClock)))
}

async fn run_server(kind: ExampleApp, config: ServerConfig) -> Result<()> {
    let dispatcher = dispatcher(kind, &config)?;
    let root_url = config.root_url();

    info!(
        app_id = %kind.app_id(),
        addr = %config.listen_addr(),
        root_url = %root_url,
        "Starting app"
    );
    info!("Install via /apps install http {}/manifest.json", root_url);

    appbridge_gateway::start_server(&config.listen_addr(), dispatcher).await
}
