//! Call Event Logger
//!
//! One structured entry per dispatch milestone, emitted under the `app_calls`
//! target so it can be filtered or routed separately.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::redact::redact_sensitive_data;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CallEvent {
    Dispatched {
        path: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        hook: Option<String>,
        acting_user_id: String,
    },
    Responded {
        path: String,
        variant: String,
        elapsed_ms: u64,
    },
    DecodeFallback {
        path: String,
        reason: String,
    },
    OutboundFailed {
        path: String,
        error: String,
    },
    DispatchMiss {
        path: String,
    },
}

impl CallEvent {
    fn is_problem(&self) -> bool {
        matches!(
            self,
            Self::DecodeFallback { .. } | Self::OutboundFailed { .. } | Self::DispatchMiss { .. }
        )
    }
}

#[derive(Debug, Serialize)]
pub struct CallLogEntry {
    pub app_id: String,
    pub timestamp: DateTime<Utc>,
    pub event: CallEvent,
}

pub struct CallLogger;

impl CallLogger {
    /// Log a call event, scrubbing free-form text first.
    pub fn log(app_id: &str, mut event: CallEvent) {
        match &mut event {
            CallEvent::DecodeFallback { reason, .. } => *reason = redact_sensitive_data(reason),
            CallEvent::OutboundFailed { error, .. } => *error = redact_sensitive_data(error),
            _ => {}
        }

        let problem = event.is_problem();
        let entry = CallLogEntry { app_id: app_id.to_string(), timestamp: Utc::now(), event };
        if problem {
            warn!(target: "app_calls", entry = ?entry, "App call event");
        } else {
            info!(target: "app_calls", entry = ?entry, "App call event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_type_tag() {
        let event = CallEvent::Dispatched {
            path: "/install".into(),
            hook: Some("on_install".into()),
            acting_user_id: "u1".into(),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "dispatched");
        assert_eq!(value["hook"], "on_install");
        assert!(CallEvent::DispatchMiss { path: "/x".into() }.is_problem());
    }
}
