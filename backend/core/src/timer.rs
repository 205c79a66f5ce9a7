//! Client-facing half of the timer contract.
//!
//! A timer asks the host to invoke `call` once at or after `at`. The host owns
//! persistence and firing and may deliver more than once, so the handler bound
//! to `call.path` must be idempotent and must not rely on state from the
//! request that created the timer. There is no cancel or query operation.

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::call::Call;
use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timer {
    /// Absolute fire time, epoch milliseconds.
    pub at: i64,
    pub call: Call,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub team_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub channel_id: String,
}

impl Timer {
    pub fn at(at: DateTime<Utc>, call: Call) -> Self {
        Self { at: at.timestamp_millis(), call, team_id: String::new(), channel_id: String::new() }
    }

    /// Fire `seconds` after `now`. Negative offsets yield a fire time in the past,
    /// which the host delivers immediately.
    pub fn after(now: DateTime<Utc>, seconds: i64, call: Call) -> Result<Self, AppError> {
        let at = Duration::try_seconds(seconds)
            .and_then(|offset| now.checked_add_signed(offset))
            .ok_or(AppError::TimerOutOfRange)?;
        Ok(Self::at(at, call))
    }

    pub fn in_channel(mut self, team_id: impl Into<String>, channel_id: impl Into<String>) -> Self {
        self.team_id = team_id.into();
        self.channel_id = channel_id.into();
        self
    }

    pub fn fire_time(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.at).single()
    }
}
