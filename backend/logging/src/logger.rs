//! Structured Logger
//!
//! Wraps `tracing` to provide console output, optional rolling NDJSON files,
//! and environment-based level control.

use std::path::PathBuf;

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

#[derive(Debug, Clone)]
pub struct LoggerOptions {
    /// Default filter directive; `RUST_LOG` takes precedence when set.
    pub level: String,
    /// Directory for `appbridge.log.YYYY-MM-DD`; no file output when `None`.
    pub log_dir: Option<PathBuf>,
    /// JSON instead of human-readable console lines.
    pub json: bool,
    /// Console output on stderr, keeping stdout free for command output.
    pub stderr: bool,
}

impl Default for LoggerOptions {
    fn default() -> Self {
        Self { level: "info".to_string(), log_dir: None, json: false, stderr: false }
    }
}

/// Initialize the global subscriber. Calling it again is a no-op.
pub fn init_logger(options: &LoggerOptions) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&options.level));

    let writer = if options.stderr {
        BoxMakeWriter::new(std::io::stderr)
    } else {
        BoxMakeWriter::new(std::io::stdout)
    };
    let console_layer = if options.json {
        fmt::layer().json().with_writer(writer).boxed()
    } else {
        fmt::layer()
            .with_writer(writer)
            .with_target(false)
            .with_ansi(true)
            .boxed()
    };

    let file_layer = options.log_dir.as_ref().map(|dir| {
        let appender = RollingFileAppender::new(Rotation::DAILY, dir, "appbridge.log");
        fmt::layer().json().with_writer(appender).with_ansi(false)
    });

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init();
}
