//! Request-body decoding.
//!
//! Decoding is deliberately permissive: a body that is empty or does not parse
//! as a call request yields a zero-value [`CallRequest`] and the handler runs
//! anyway. The fallback is reported through [`DecodeOutcome`] so the caller can
//! log it; it is never an error.

use std::fmt;

use appbridge_core::CallRequest;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    EmptyBody,
    Malformed(String),
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyBody => f.write_str("empty body"),
            Self::Malformed(err) => write!(f, "malformed body: {err}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeOutcome {
    Decoded,
    Fallback(FallbackReason),
}

impl DecodeOutcome {
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback(_))
    }
}

/// Decode `body` as a call request routed to `path`.
///
/// The request's `path` is set to `path` when the body does not carry one.
pub fn decode_call_request(path: &str, body: &[u8]) -> (CallRequest, DecodeOutcome) {
    let (mut request, outcome) = if body.iter().all(u8::is_ascii_whitespace) {
        (CallRequest::default(), DecodeOutcome::Fallback(FallbackReason::EmptyBody))
    } else {
        match serde_json::from_slice::<CallRequest>(body) {
            Ok(request) => (request, DecodeOutcome::Decoded),
            Err(e) => (
                CallRequest::default(),
                DecodeOutcome::Fallback(FallbackReason::Malformed(e.to_string())),
            ),
        }
    };

    if request.call.path.is_empty() {
        request.call.path = path.to_string();
    }
    (request, outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_full_request() {
        let body = br#"{
            "path": "/timer/create",
            "values": {"duration": "10"},
            "context": {"acting_user": {"id": "u1"}, "channel_id": "c1"}
        }"#;
        let (req, outcome) = decode_call_request("/timer/create", body);
        assert_eq!(outcome, DecodeOutcome::Decoded);
        assert_eq!(req.value_as_int("duration"), 10);
        assert_eq!(req.context.acting_user_id(), "u1");
    }

    #[test]
    fn malformed_body_yields_zero_value_request() {
        let (req, outcome) = decode_call_request("/install", b"{not json");
        assert!(matches!(outcome, DecodeOutcome::Fallback(FallbackReason::Malformed(_))));
        assert_eq!(req.path(), "/install");
        assert_eq!(req.context.acting_user_id(), "");
        assert!(req.values.is_empty());
    }

    #[test]
    fn empty_body_is_a_fallback() {
        let (req, outcome) = decode_call_request("/ping", b"  \n");
        assert_eq!(outcome, DecodeOutcome::Fallback(FallbackReason::EmptyBody));
        assert_eq!(req.path(), "/ping");
    }

    #[test]
    fn wrong_shape_is_malformed() {
        let (_, outcome) = decode_call_request("/ping", b"[1, 2, 3]");
        assert!(outcome.is_fallback());
    }
}
