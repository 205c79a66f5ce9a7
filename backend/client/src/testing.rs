//! In-memory test doubles for handler tests.
//!
//! [`RecordingClientFactory`] hands out clients that record every direct message
//! and timer instead of contacting a host, and can be told to fail either one.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use appbridge_core::{Context, Timer};

use crate::{AppActions, ClientError, ClientFactory, Identity, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub identity: Identity,
    pub to_user_id: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreatedTimer {
    pub identity: Identity,
    pub timer: Timer,
}

#[derive(Debug, Default)]
struct Recorded {
    messages: Vec<SentMessage>,
    timers: Vec<CreatedTimer>,
}

#[derive(Clone, Default)]
pub struct RecordingClientFactory {
    recorded: Arc<Mutex<Recorded>>,
    dm_failure: Option<String>,
    timer_failure: Option<String>,
}

impl RecordingClientFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `direct_message` fails with `message`.
    pub fn failing_direct_messages(mut self, message: impl Into<String>) -> Self {
        self.dm_failure = Some(message.into());
        self
    }

    /// Every `create_timer` fails with `message`.
    pub fn failing_timers(mut self, message: impl Into<String>) -> Self {
        self.timer_failure = Some(message.into());
        self
    }

    pub fn messages(&self) -> Vec<SentMessage> {
        self.lock().messages.clone()
    }

    pub fn timers(&self) -> Vec<CreatedTimer> {
        self.lock().timers.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Recorded> {
        // A panicking test thread must not hide what was recorded.
        self.recorded.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ClientFactory for RecordingClientFactory {
    fn client(&self, identity: Identity, _context: &Context) -> Arc<dyn AppActions> {
        Arc::new(RecordingClient { identity, factory: self.clone() })
    }
}

pub struct RecordingClient {
    identity: Identity,
    factory: RecordingClientFactory,
}

#[async_trait]
impl AppActions for RecordingClient {
    fn identity(&self) -> Identity {
        self.identity
    }

    async fn direct_message(&self, user_id: &str, text: &str) -> Result<String> {
        if let Some(message) = &self.factory.dm_failure {
            return Err(ClientError::Rejected(message.clone()));
        }
        let mut recorded = self.factory.lock();
        recorded.messages.push(SentMessage {
            identity: self.identity,
            to_user_id: user_id.to_string(),
            text: text.to_string(),
        });
        Ok(format!("post-{}", recorded.messages.len()))
    }

    async fn create_timer(&self, timer: &Timer) -> Result<()> {
        if let Some(message) = &self.factory.timer_failure {
            return Err(ClientError::Rejected(message.clone()));
        }
        self.factory
            .lock()
            .timers
            .push(CreatedTimer { identity: self.identity, timer: timer.clone() });
        Ok(())
    }
}
