//! Invocation targets and the context-expansion hints attached to them.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How much of a referenced entity the host should resolve before invoking a call.
///
/// The `+` forms ask the host to fail the call when the entity cannot be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExpandLevel {
    #[serde(rename = "none")]
    None,
    #[serde(rename = "id")]
    Id,
    #[serde(rename = "summary")]
    Summary,
    #[serde(rename = "all")]
    All,
    #[serde(rename = "+id")]
    RequireId,
    #[serde(rename = "+summary")]
    RequireSummary,
    #[serde(rename = "+all")]
    RequireAll,
}

impl ExpandLevel {
    pub fn is_required(self) -> bool {
        matches!(self, Self::RequireId | Self::RequireSummary | Self::RequireAll)
    }

    /// Whether the host is asked for more than the bare identifier.
    pub fn includes_details(self) -> bool {
        matches!(
            self,
            Self::Summary | Self::All | Self::RequireSummary | Self::RequireAll
        )
    }
}

/// Declarative expansion request. Callees must still tolerate partially
/// populated context: the host's policy may differ from what was asked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expand {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app: Option<ExpandLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acting_user: Option<ExpandLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acting_user_access_token: Option<ExpandLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<ExpandLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<ExpandLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_member: Option<ExpandLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<ExpandLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_member: Option<ExpandLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post: Option<ExpandLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_post: Option<ExpandLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<ExpandLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oauth2_app: Option<ExpandLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oauth2_user: Option<ExpandLevel>,
}

impl Expand {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// A named invocation target: a path into the app's route table plus the
/// context the host should resolve before calling it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Call {
    #[serde(default)]
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expand: Option<Expand>,
    /// Opaque state echoed back by the host on invocation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<Value>,
}

impl Call {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into(), expand: None, state: None }
    }

    pub fn with_expand(mut self, expand: Expand) -> Self {
        self.expand = if expand.is_empty() { None } else { Some(expand) };
        self
    }

    pub fn with_state(mut self, state: Value) -> Self {
        self.state = Some(state);
        self
    }
}
