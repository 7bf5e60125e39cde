//! Projects the registry's active capability modules onto the MCP wire
//! types: tool/resource/prompt listings and dispatch.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::capability::{PromptProvider, ResourceProvider, ToolProvider};
use crate::envelope::ToolEnvelope;
use crate::error::{McpError, McpResult};
use crate::onboarding::{CapabilitiesSnapshot, CapabilitySource, PromptSummary, ResourceSummary, ToolSummary};
use crate::protocol::{Prompt, PromptsGetResult, Resource, ResourceContent, Tool, ToolContent, ToolsCallResult};
use crate::registry::CapabilityRegistry;
use crate::security::TenantContext;

/// Aggregates the active modules' contributions into a single MCP surface.
///
/// Holds the typed provider lists for the lifetime of the server; the
/// registry alone decides which module ids are currently active. Per the
/// dynamic-deregistration open question, a call to a deactivated module's
/// tool/resource/prompt is rejected with `PLUGIN_INACTIVE` at dispatch time
/// rather than hidden from `tools/list` (the transport has no support for
/// unregistering an already-advertised capability).
pub struct McpAdapter {
    registry: Arc<CapabilityRegistry>,
    tool_providers: Vec<Arc<dyn ToolProvider>>,
    resource_providers: Vec<Arc<dyn ResourceProvider>>,
    prompt_providers: Vec<Arc<dyn PromptProvider>>,
}

impl McpAdapter {
    pub fn new(
        registry: Arc<CapabilityRegistry>,
        tool_providers: Vec<Arc<dyn ToolProvider>>,
        resource_providers: Vec<Arc<dyn ResourceProvider>>,
        prompt_providers: Vec<Arc<dyn PromptProvider>>,
    ) -> Self {
        Self {
            registry,
            tool_providers,
            resource_providers,
            prompt_providers,
        }
    }

    /// In this library listings are recomputed on every `tools/list` rather
    /// than pushed to the transport once, so there is no dynamic add-tool
    /// call to make here. Kept as a no-op to preserve the documented
    /// startup ordering: the initial registry sync MUST precede it.
    pub fn register_all(&self) {}

    fn find_tool_provider(&self, tool_name: &str) -> Option<&Arc<dyn ToolProvider>> {
        self.tool_providers.iter().find(|p| p.tools().iter().any(|t| t.name == tool_name))
    }

    fn find_resource_provider(&self, uri: &str) -> Option<&Arc<dyn ResourceProvider>> {
        self.resource_providers.iter().find(|p| p.resources().iter().any(|r| r.uri == uri))
    }

    fn find_prompt_provider(&self, name: &str) -> Option<&Arc<dyn PromptProvider>> {
        self.prompt_providers.iter().find(|p| p.prompts().iter().any(|pr| pr.name == name))
    }

    pub async fn list_tools(&self) -> Vec<Tool> {
        let mut tools = Vec::new();
        for provider in &self.tool_providers {
            for descriptor in provider.tools() {
                tools.push(Tool {
                    name: descriptor.name,
                    description: descriptor.description,
                    input_schema: descriptor.input_schema,
                    metadata: HashMap::new(),
                });
            }
        }
        tools
    }

    pub async fn call_tool(&self, ctx: &TenantContext, name: &str, arguments: Option<Value>) -> ToolsCallResult {
        let envelope = match self.find_tool_provider(name) {
            None => ToolEnvelope::error("METHOD_NOT_FOUND", format!("unknown tool '{name}'")),
            Some(provider) if !self.registry.is_active(provider.id()).await => {
                ToolEnvelope::from(&McpError::plugin_inactive(provider.id()))
            }
            Some(provider) => provider.call_tool(ctx, name, arguments.unwrap_or(Value::Null)).await,
        };
        let is_error = envelope.status != crate::envelope::EnvelopeStatus::Ok;
        ToolsCallResult {
            content: vec![ToolContent::Text { text: envelope.to_pretty_json() }],
            is_error,
            metadata: HashMap::new(),
        }
    }

    pub async fn list_resources(&self) -> Vec<Resource> {
        let mut resources = Vec::new();
        for provider in &self.resource_providers {
            for descriptor in provider.resources() {
                resources.push(Resource {
                    uri: descriptor.uri,
                    name: descriptor.name,
                    description: descriptor.description,
                    mime_type: descriptor.mime_type,
                    metadata: HashMap::new(),
                });
            }
        }
        resources
    }

    pub async fn read_resource(&self, ctx: &TenantContext, uri: &str) -> McpResult<Vec<ResourceContent>> {
        let provider = self.find_resource_provider(uri).ok_or_else(|| McpError::ResourceNotFound {
            resource_type: "resource".to_string(),
            resource_id: uri.to_string(),
        })?;
        if !self.registry.is_active(provider.id()).await {
            return Err(McpError::plugin_inactive(provider.id()));
        }
        let value = provider.read_resource(ctx, uri).await?;
        let mime_type = provider.resources().into_iter().find(|r| r.uri == uri).and_then(|r| r.mime_type);
        let text = match &value {
            Value::String(s) => s.clone(),
            other => serde_json::to_string_pretty(other).unwrap_or_default(),
        };
        Ok(vec![ResourceContent::Text { text, uri: uri.to_string(), mime_type }])
    }

    pub async fn list_prompts(&self) -> Vec<Prompt> {
        let mut prompts = Vec::new();
        for provider in &self.prompt_providers {
            prompts.extend(provider.prompts());
        }
        prompts
    }

    pub async fn get_prompt(&self, ctx: &TenantContext, name: &str, arguments: Value) -> McpResult<PromptsGetResult> {
        let provider = self.find_prompt_provider(name).ok_or_else(|| McpError::tool_not_found(name))?;
        if !self.registry.is_active(provider.id()).await {
            return Err(McpError::plugin_inactive(provider.id()));
        }
        provider.get_prompt(ctx, name, arguments).await
    }
}

/// Bridges the adapter's live listings into the onboarding module's
/// capabilities index without the onboarding module depending on the
/// adapter's concrete type.
pub struct AdapterCapabilitySource {
    adapter: Arc<McpAdapter>,
}

impl AdapterCapabilitySource {
    pub fn new(adapter: Arc<McpAdapter>) -> Self {
        Self { adapter }
    }
}

impl CapabilitySource for AdapterCapabilitySource {
    fn snapshot(&self) -> CapabilitiesSnapshot {
        let tools = self
            .adapter
            .tool_providers
            .iter()
            .flat_map(|p| p.tools())
            .map(|t| ToolSummary {
                name: t.name,
                description: t.description,
                example_params: Value::Object(Default::default()),
            })
            .collect();
        let resources = self
            .adapter
            .resource_providers
            .iter()
            .flat_map(|p| p.resources())
            .map(|r| ResourceSummary {
                uri: r.uri,
                name: r.name,
                mime_type: r.mime_type.unwrap_or_else(|| "application/json".to_string()),
            })
            .collect();
        let prompts = self
            .adapter
            .prompt_providers
            .iter()
            .flat_map(|p| p.prompts())
            .map(|p| PromptSummary {
                plugin: "prompts".to_string(),
                name: p.name,
                description: p.description.unwrap_or_default(),
            })
            .collect();
        CapabilitiesSnapshot { tools, resources, prompts }
    }
}
