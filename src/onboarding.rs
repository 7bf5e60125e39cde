//! Self-describing onboarding resources: a capabilities index, a fixed
//! intent→tool map, and a markdown quickstart.

use std::sync::RwLock;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::capability::{CapabilityModule, ResourceDescriptor, ResourceProvider};
use crate::error::{McpError, McpResult};
use crate::security::TenantContext;

pub const URI_CAPABILITIES: &str = "onboarding/capabilities";
pub const URI_INTENT_MAP: &str = "onboarding/intent-map";
pub const URI_QUICKSTART: &str = "onboarding/quickstart";

/// What the onboarding module needs from the MCP adapter: a live snapshot
/// of everything currently registered across active modules. Implemented
/// by the adapter and injected via [`OnboardingModule::set_source`] after
/// construction, breaking the cycle between "the adapter aggregates
/// onboarding's resources" and "onboarding describes the adapter's state".
pub trait CapabilitySource: Send + Sync {
    fn snapshot(&self) -> CapabilitiesSnapshot;
}

#[derive(Debug, Clone, Default)]
pub struct CapabilitiesSnapshot {
    pub tools: Vec<ToolSummary>,
    pub resources: Vec<ResourceSummary>,
    pub prompts: Vec<PromptSummary>,
}

#[derive(Debug, Clone)]
pub struct ToolSummary {
    pub name: String,
    pub description: String,
    pub example_params: Value,
}

#[derive(Debug, Clone)]
pub struct ResourceSummary {
    pub uri: String,
    pub name: String,
    pub mime_type: String,
}

#[derive(Debug, Clone)]
pub struct PromptSummary {
    pub plugin: String,
    pub name: String,
    pub description: String,
}

const MODULE_ID: &str = "onboarding";

pub struct OnboardingModule {
    source: RwLock<Option<std::sync::Arc<dyn CapabilitySource>>>,
}

impl OnboardingModule {
    /// Constructed with a null provider; the lifecycle coordinator calls
    /// [`set_source`](Self::set_source) once the adapter exists, before the
    /// first capability-registration pass.
    pub fn new() -> Self {
        Self { source: RwLock::new(None) }
    }

    pub fn set_source(&self, source: std::sync::Arc<dyn CapabilitySource>) {
        *self.source.write().expect("onboarding source lock poisoned") = Some(source);
    }

    fn capabilities_index(&self) -> Value {
        let snapshot = self
            .source
            .read()
            .expect("onboarding source lock poisoned")
            .as_ref()
            .map(|s| s.snapshot())
            .unwrap_or_default();

        json!({
            "tools": snapshot.tools.iter().map(|t| json!({
                "tool": t.name,
                "description": t.description,
                "example_params": t.example_params,
            })).collect::<Vec<_>>(),
            "resources": snapshot.resources.iter().map(|r| json!({
                "resource": r.uri,
                "name": r.name,
                "mime": r.mime_type,
            })).collect::<Vec<_>>(),
            "prompts": snapshot.prompts.iter().map(|p| json!({
                "plugin": p.plugin,
                "name": p.name,
                "description": p.description,
            })).collect::<Vec<_>>(),
        })
    }

    fn intent_map(&self) -> Value {
        json!({
            "deploy an application": {"tool": "apps.deploy", "params": ["app_name", "git_ref"]},
            "list applications": {"tool": "apps.list", "params": []},
            "check application status": {"tool": "status.get", "params": ["app_name"]},
            "add a domain": {"tool": "domains.add", "params": ["domain"]},
            "enable https": {"tool": "tls.enable", "params": ["app_name"]},
            "roll back a deployment": {"tool": "apps.rollback", "params": ["deployment_id"]},
        })
    }

    fn quickstart(&self) -> &'static str {
        "# Dokku MCP Quickstart\n\n\
         This server exposes a Dokku host's control plane as MCP tools.\n\n\
         - `apps.list` / `apps.create` / `apps.destroy` manage applications.\n\
         - `apps.deploy` pushes a git ref, creating the app if it doesn't exist.\n\
         - `status.get` reports the derived state of an application.\n\
         - `domains.*` and `tls.enable` manage routing and certificates.\n\n\
         Read `onboarding/capabilities` for the live list of active tools, \
         resources, and prompts, and `onboarding/intent-map` for a natural-\
         language index into them."
    }
}

impl Default for OnboardingModule {
    fn default() -> Self {
        Self::new()
    }
}

impl CapabilityModule for OnboardingModule {
    fn id(&self) -> &str {
        MODULE_ID
    }
    fn name(&self) -> &str {
        "Onboarding"
    }
    fn description(&self) -> &str {
        "Self-describing capabilities index, intent map, and quickstart."
    }
    fn version(&self) -> &str {
        "1.0.0"
    }
}

#[async_trait]
impl ResourceProvider for OnboardingModule {
    fn resources(&self) -> Vec<ResourceDescriptor> {
        vec![
            ResourceDescriptor {
                uri: URI_CAPABILITIES.to_string(),
                name: "Capabilities Index".to_string(),
                description: Some("Enumerates active tools, resources, and prompts.".to_string()),
                mime_type: Some("application/json".to_string()),
            },
            ResourceDescriptor {
                uri: URI_INTENT_MAP.to_string(),
                name: "Intent Map".to_string(),
                description: Some("Maps natural-language intents to tool invocations.".to_string()),
                mime_type: Some("application/json".to_string()),
            },
            ResourceDescriptor {
                uri: URI_QUICKSTART.to_string(),
                name: "Quickstart".to_string(),
                description: Some("Human-readable orientation.".to_string()),
                mime_type: Some("text/markdown".to_string()),
            },
        ]
    }

    async fn read_resource(&self, _ctx: &TenantContext, uri: &str) -> McpResult<Value> {
        match uri {
            URI_CAPABILITIES => Ok(self.capabilities_index()),
            URI_INTENT_MAP => Ok(self.intent_map()),
            URI_QUICKSTART => Ok(Value::String(self.quickstart().to_string())),
            other => Err(McpError::ResourceNotFound {
                resource_type: "onboarding".to_string(),
                resource_id: other.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EmptySource;
    impl CapabilitySource for EmptySource {
        fn snapshot(&self) -> CapabilitiesSnapshot {
            CapabilitiesSnapshot::default()
        }
    }

    #[tokio::test]
    async fn capabilities_index_is_empty_before_source_injected() {
        let module = OnboardingModule::new();
        let tenant = TenantContext::default_tenant();
        let value = module.read_resource(&tenant, URI_CAPABILITIES).await.unwrap();
        assert_eq!(value["tools"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn unknown_uri_is_not_found() {
        let module = OnboardingModule::new();
        let tenant = TenantContext::default_tenant();
        let result = module.read_resource(&tenant, "onboarding/nope").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn injected_source_populates_index() {
        let module = OnboardingModule::new();
        module.set_source(std::sync::Arc::new(EmptySource));
        let tenant = TenantContext::default_tenant();
        let value = module.read_resource(&tenant, URI_CAPABILITIES).await.unwrap();
        assert!(value["tools"].is_array());
    }
}
