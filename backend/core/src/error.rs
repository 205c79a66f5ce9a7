use thiserror::Error;

/// Misconfiguration of an app definition. Surfacing one of these at startup is fatal.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid manifest: {0}")]
    InvalidManifest(String),

    #[error("duplicate field `{field}` in form `{form}`")]
    DuplicateField { form: String, field: String },

    #[error("form `{form}` has a field with an empty name")]
    UnnamedField { form: String },

    #[error("call path `{path}` referenced by {referrer} has no registered handler")]
    DanglingCall { path: String, referrer: String },

    #[error("timer fire time is out of range")]
    TimerOutOfRange,

    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}
