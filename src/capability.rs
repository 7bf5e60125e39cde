//! The contract a capability module implements to plug into the MCP surface.

use async_trait::async_trait;
use serde_json::Value;

use crate::envelope::ToolEnvelope;
use crate::error::McpResult;
use crate::protocol::{Prompt, PromptsGetResult};
use crate::security::TenantContext;

/// Identity and metadata every capability module exposes, independent of
/// whether it currently provides tools, resources, or prompts.
pub trait CapabilityModule: Send + Sync {
    /// Stable identifier used by the registry and in `PLUGIN_INACTIVE` errors.
    fn id(&self) -> &str;

    /// Human-readable display name.
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    fn version(&self) -> &str;

    /// The Dokku plugin name this module's activity is tied to, as reported
    /// by `plugin:list`. `None` for modules that are always active
    /// (core lifecycle/domain modules with no corresponding Dokku plugin).
    fn dokku_plugin_name(&self) -> Option<&str> {
        None
    }
}

/// A resource this module exposes under `resources/list` and `resources/read`.
#[derive(Debug, Clone)]
pub struct ResourceDescriptor {
    pub uri: String,
    pub name: String,
    pub description: Option<String>,
    pub mime_type: Option<String>,
}

#[async_trait]
pub trait ResourceProvider: CapabilityModule {
    fn resources(&self) -> Vec<ResourceDescriptor>;

    async fn read_resource(&self, ctx: &TenantContext, uri: &str) -> McpResult<Value>;
}

/// A tool this module exposes under `tools/list` and `tools/call`.
#[derive(Debug, Clone)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

#[async_trait]
pub trait ToolProvider: CapabilityModule {
    fn tools(&self) -> Vec<ToolDescriptor>;

    /// Handlers never fail their caller with a raw error: validation,
    /// whitelist, and remote-execution failures are all reported inside the
    /// returned envelope's `error` status.
    async fn call_tool(&self, ctx: &TenantContext, name: &str, arguments: Value) -> ToolEnvelope;
}

#[async_trait]
pub trait PromptProvider: CapabilityModule {
    fn prompts(&self) -> Vec<Prompt>;

    async fn get_prompt(
        &self,
        ctx: &TenantContext,
        name: &str,
        arguments: Value,
    ) -> McpResult<PromptsGetResult>;
}
