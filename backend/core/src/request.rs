//! The decoded context of one invocation.
//!
//! Everything here is built by the host per call and may be only partially
//! populated, depending on how much of the requested expansion the host honored.
//! Accessors therefore fall back to empty values instead of failing.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::call::Call;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub username: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub email: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub first_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub last_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub nickname: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub locale: String,
}

impl User {
    pub fn stub(id: impl Into<String>) -> Self {
        Self { id: id.into(), ..Default::default() }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub team_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub display_name: String,
    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub kind: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub display_name: String,
}

/// Call context: who is acting, where, and the credentials the host issued
/// for this invocation.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Context {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub subject: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub app_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub location: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub user_agent: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub team_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub channel_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub post_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub root_post_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acting_user: Option<User>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<Channel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<Team>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub locale: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub mattermost_site_url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub app_path: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub bot_user_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub bot_access_token: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub acting_user_access_token: String,
}

impl Context {
    pub fn acting_user_id(&self) -> &str {
        self.acting_user.as_ref().map(|u| u.id.as_str()).unwrap_or("")
    }

    pub fn channel_id(&self) -> &str {
        match &self.channel {
            Some(c) if !c.id.is_empty() => &c.id,
            _ => &self.channel_id,
        }
    }

    pub fn team_id(&self) -> &str {
        if let Some(t) = self.team.as_ref().filter(|t| !t.id.is_empty()) {
            return &t.id;
        }
        if !self.team_id.is_empty() {
            return &self.team_id;
        }
        self.channel.as_ref().map(|c| c.team_id.as_str()).unwrap_or("")
    }
}

fn mask(secret: &str) -> &'static str {
    if secret.is_empty() { "" } else { "[REDACTED]" }
}

// Tokens never reach log output through `{:?}`.
impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("app_id", &self.app_id)
            .field("location", &self.location)
            .field("team_id", &self.team_id())
            .field("channel_id", &self.channel_id())
            .field("acting_user_id", &self.acting_user_id())
            .field("mattermost_site_url", &self.mattermost_site_url)
            .field("bot_user_id", &self.bot_user_id)
            .field("bot_access_token", &mask(&self.bot_access_token))
            .field("acting_user_access_token", &mask(&self.acting_user_access_token))
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CallRequest {
    #[serde(flatten)]
    pub call: Call,
    /// Submitted form values keyed by field name.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub values: Map<String, Value>,
    #[serde(default)]
    pub context: Context,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub raw_command: String,
    /// Field that triggered a form refresh, if any.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub selected_field: String,
    /// Partial user input for a dynamic lookup.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub query: String,
}

impl CallRequest {
    pub fn path(&self) -> &str {
        &self.call.path
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// String form of a submitted value. Select options contribute their
    /// `value` member; anything else yields `default`.
    pub fn value_str(&self, name: &str, default: &str) -> String {
        match self.values.get(name) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Object(option)) => match option.get("value") {
                Some(Value::String(s)) => s.clone(),
                _ => default.to_string(),
            },
            _ => default.to_string(),
        }
    }

    /// Integer form of a submitted value under the permissive policy of
    /// [`parse_int_permissive`]. JSON numbers are taken as-is (truncated).
    pub fn value_as_int(&self, name: &str) -> i64 {
        match self.values.get(name) {
            Some(Value::Number(n)) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f as i64))
                .unwrap_or(0),
            _ => parse_int_permissive(&self.value_str(name, "")),
        }
    }
}

/// Parse a base-10 integer, yielding 0 for anything that is not one.
///
/// No trimming: `" 10"` parses to 0, as does `""`, `"abc"` and `"1.5"`.
pub fn parse_int_permissive(input: &str) -> i64 {
    input.parse::<i64>().unwrap_or(0)
}
