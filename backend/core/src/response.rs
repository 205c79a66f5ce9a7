/// Call responses: exactly one variant per invocation.
///
/// On the wire the host distinguishes them by `type`: text and data both
/// travel as `"ok"`, told apart by which member is present.
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::binding::Form;

#[derive(Debug, Clone, PartialEq)]
pub enum CallResponse {
    /// Human-readable message shown to the invoking user. May be empty.
    Text { text: String },
    /// Structured payload for data queries (bindings, lookups).
    Data { data: Value },
    /// Failure surfaced in context to the invoking user.
    Error { text: String },
    /// A (refreshed) form for the client to render.
    Form { form: Box<Form> },
    Navigate { url: String, use_external_browser: bool },
}

impl CallResponse {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn data(data: Value) -> Self {
        Self::Data { data }
    }

    /// Serialize `payload` into a data response.
    pub fn data_from<T: Serialize>(payload: &T) -> Result<Self, serde_json::Error> {
        Ok(Self::Data { data: serde_json::to_value(payload)? })
    }

    pub fn error(err: impl fmt::Display) -> Self {
        Self::Error { text: err.to_string() }
    }

    pub fn form(form: Form) -> Self {
        Self::Form { form: Box::new(form) }
    }

    pub fn navigate(url: impl Into<String>) -> Self {
        Self::Navigate { url: url.into(), use_external_browser: false }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    pub fn variant_name(&self) -> &'static str {
        match self {
            Self::Text { .. } => "text",
            Self::Data { .. } => "data",
            Self::Error { .. } => "error",
            Self::Form { .. } => "form",
            Self::Navigate { .. } => "navigate",
        }
    }
}

#[derive(Default, Serialize, Deserialize)]
struct WireResponse {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    form: Option<Form>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    navigate_to_url: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    use_external_browser: bool,
}

/// A member that is present but `null` still selects the data variant.
fn present<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

fn non_empty(text: &str) -> Option<String> {
    (!text.is_empty()).then(|| text.to_string())
}

impl Serialize for CallResponse {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let wire = match self {
            Self::Text { text } => WireResponse {
                kind: "ok".into(),
                text: non_empty(text),
                ..Default::default()
            },
            Self::Data { data } => WireResponse {
                kind: "ok".into(),
                data: Some(data.clone()),
                ..Default::default()
            },
            Self::Error { text } => WireResponse {
                kind: "error".into(),
                text: non_empty(text),
                ..Default::default()
            },
            Self::Form { form } => WireResponse {
                kind: "form".into(),
                form: Some(form.as_ref().clone()),
                ..Default::default()
            },
            Self::Navigate { url, use_external_browser } => WireResponse {
                kind: "navigate".into(),
                navigate_to_url: Some(url.clone()),
                use_external_browser: *use_external_browser,
                ..Default::default()
            },
        };
        wire.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for CallResponse {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        use serde::de::Error;

        let wire = WireResponse::deserialize(deserializer)?;
        match wire.kind.as_str() {
            // An absent type is treated as "ok".
            "ok" | "" => Ok(match wire.data {
                Some(data) => Self::Data { data },
                None => Self::Text { text: wire.text.unwrap_or_default() },
            }),
            "error" => Ok(Self::Error { text: wire.text.unwrap_or_default() }),
            "form" => wire
                .form
                .map(Self::form)
                .ok_or_else(|| D::Error::missing_field("form")),
            "navigate" => wire
                .navigate_to_url
                .map(|url| Self::Navigate { url, use_external_browser: wire.use_external_browser })
                .ok_or_else(|| D::Error::missing_field("navigate_to_url")),
            other => Err(D::Error::unknown_variant(other, &["ok", "error", "form", "navigate"])),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn wire_shapes() {
        assert_eq!(
            serde_json::to_value(CallResponse::text("hi")).unwrap(),
            json!({"type": "ok", "text": "hi"})
        );
        assert_eq!(serde_json::to_value(CallResponse::text("")).unwrap(), json!({"type": "ok"}));
        assert_eq!(
            serde_json::to_value(CallResponse::data(json!({}))).unwrap(),
            json!({"type": "ok", "data": {}})
        );
        assert_eq!(
            serde_json::to_value(CallResponse::error("permission denied")).unwrap(),
            json!({"type": "error", "text": "permission denied"})
        );
    }

    #[test]
    fn every_variant_carries_a_single_payload() {
        let responses = [
            CallResponse::text("a"),
            CallResponse::data(json!([1])),
            CallResponse::error("b"),
            CallResponse::form(Form::default()),
            CallResponse::navigate("http://x"),
        ];
        for response in responses {
            let value = serde_json::to_value(&response).unwrap();
            let payloads = ["text", "data", "form", "navigate_to_url"]
                .iter()
                .filter(|k| value.get(**k).is_some())
                .count();
            assert_eq!(payloads, 1, "{value}");
        }
    }

    #[test]
    fn decodes_ok_variants() {
        let data: CallResponse = serde_json::from_value(json!({"type": "ok", "data": [1]})).unwrap();
        assert_eq!(data, CallResponse::data(json!([1])));
        let text: CallResponse = serde_json::from_value(json!({"type": "ok"})).unwrap();
        assert_eq!(text, CallResponse::text(""));
        assert!(serde_json::from_value::<CallResponse>(json!({"type": "bogus"})).is_err());
    }

    #[test]
    fn null_data_stays_a_data_response() {
        let response = CallResponse::data(Value::Null);
        let wire = serde_json::to_value(&response).unwrap();
        assert_eq!(wire, json!({"type": "ok", "data": null}));
        let back: CallResponse = serde_json::from_value(wire).unwrap();
        assert_eq!(back, response);
    }
}
