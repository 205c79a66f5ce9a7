//! `appbridge-client`: the outbound half of an app.
//!
//! A handler obtains an [`AppActions`] handle from a [`ClientFactory`] for one of
//! two identities: the app's bot, or the user who triggered the call. Both share
//! the same operations; only the credentials taken from the call context differ.
//! Every operation is one request with no retry, and none is idempotent.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use appbridge_core::{Context, Timer};

pub mod error;
pub mod http;
pub mod testing;

pub use error::ClientError;
pub use http::{HttpAppClient, HttpClientFactory, DEFAULT_TIMEOUT};

pub type Result<T> = std::result::Result<T, ClientError>;

/// Whose authority an outbound request carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Identity {
    Bot,
    ActingUser,
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bot => f.write_str("bot"),
            Self::ActingUser => f.write_str("acting user"),
        }
    }
}

/// Capability handle scoped to one identity.
#[async_trait]
pub trait AppActions: Send + Sync {
    fn identity(&self) -> Identity;

    /// Post `text` into the direct channel between this identity and `user_id`.
    /// Returns the id of the created post.
    async fn direct_message(&self, user_id: &str, text: &str) -> Result<String>;

    /// Register a one-shot timer with the host.
    async fn create_timer(&self, timer: &Timer) -> Result<()>;
}

/// Produces identity-scoped clients from a call context.
pub trait ClientFactory: Send + Sync {
    fn client(&self, identity: Identity, context: &Context) -> Arc<dyn AppActions>;

    fn as_bot(&self, context: &Context) -> Arc<dyn AppActions> {
        self.client(Identity::Bot, context)
    }

    fn as_acting_user(&self, context: &Context) -> Arc<dyn AppActions> {
        self.client(Identity::ActingUser, context)
    }
}
