//! The response shape every tool call returns, regardless of success/failure.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvelopeStatus {
    Ok,
    Error,
    Partial,
}

/// A suggested follow-up call: `rel` names the relation (e.g. `"next"`,
/// `"related"`), `tool` the tool name to invoke, `params` the arguments to
/// invoke it with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub rel: String,
    pub tool: String,
    pub params: Value,
}

impl Link {
    pub fn new(rel: impl Into<String>, tool: impl Into<String>, params: Value) -> Self {
        Self { rel: rel.into(), tool: tool.into(), params }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolEnvelope {
    pub status: EnvelopeStatus,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none", rename = "requestId")]
    pub request_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub links: Option<Vec<Link>>,
}

impl ToolEnvelope {
    pub fn ok(message: impl Into<String>, data: Option<Value>) -> Self {
        Self {
            status: EnvelopeStatus::Ok,
            code: None,
            message: Some(message.into()),
            request_id: None,
            data,
            hint: None,
            links: None,
        }
    }

    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status: EnvelopeStatus::Error,
            code: Some(code.into()),
            message: Some(message.into()),
            request_id: None,
            data: None,
            hint: None,
            links: None,
        }
    }

    pub fn partial(message: impl Into<String>, data: Option<Value>) -> Self {
        Self {
            status: EnvelopeStatus::Partial,
            code: None,
            message: Some(message.into()),
            request_id: None,
            data,
            hint: None,
            links: None,
        }
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_links(mut self, links: Vec<Link>) -> Self {
        self.links = Some(links);
        self
    }

    /// Pretty-printed (2-space indent) JSON, the form returned as a single
    /// text content block from `tools/call`.
    pub fn to_pretty_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }
}

impl From<&crate::error::McpError> for ToolEnvelope {
    fn from(err: &crate::error::McpError) -> Self {
        ToolEnvelope::error(err.code(), err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_envelope_serializes_without_code() {
        let env = ToolEnvelope::ok("done", Some(serde_json::json!({"app": "foo"})));
        let json = env.to_pretty_json();
        assert!(json.contains("\"status\": \"ok\""));
        assert!(!json.contains("\"code\""));
    }

    #[test]
    fn error_envelope_carries_code_and_message() {
        let err = crate::error::McpError::plugin_inactive("postgres");
        let env = ToolEnvelope::from(&err);
        assert_eq!(env.status, EnvelopeStatus::Error);
        assert_eq!(env.code.as_deref(), Some("PLUGIN_INACTIVE"));
    }

    #[test]
    fn builder_methods_attach_optional_fields() {
        let env = ToolEnvelope::ok("done", None)
            .with_request_id("req-1")
            .with_hint("try again")
            .with_links(vec![Link::new("next", "apps.info", serde_json::json!({"app_name": "foo"}))]);
        assert_eq!(env.request_id.as_deref(), Some("req-1"));
        assert_eq!(env.hint.as_deref(), Some("try again"));
        assert_eq!(env.links.as_ref().unwrap().len(), 1);
        assert_eq!(env.links.as_ref().unwrap()[0].tool, "apps.info");
    }
}
