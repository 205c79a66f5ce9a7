use thiserror::Error;

use crate::Identity;

/// Failure of a single outbound request. Handlers decide whether to turn it
/// into an error response or swallow it.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{identity} access token missing from call context")]
    MissingToken { identity: Identity },

    #[error("{identity} user id missing from call context")]
    MissingUserId { identity: Identity },

    #[error("mattermost_site_url missing from call context")]
    MissingSiteUrl,

    #[error("recipient user id is empty")]
    MissingRecipient,

    #[error("failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("host returned {status} for {url}: {message}")]
    Status { url: String, status: u16, message: String },

    #[error("unexpected response from {url}: {message}")]
    Decode { url: String, message: String },

    /// Raised by test doubles and by callers that refuse an action up front.
    #[error("{0}")]
    Rejected(String),
}
