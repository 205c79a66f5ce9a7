//! Structured logging for appbridge apps.
//!
//! Console and rolling NDJSON file output, secret redaction, and the per-call
//! event log emitted by the dispatcher.

pub mod call_log;
pub mod logger;
pub mod redact;

pub use call_log::{CallEvent, CallLogEntry, CallLogger};
pub use logger::{init_logger, LoggerOptions};
pub use redact::{redact_json, redact_sensitive_data};
