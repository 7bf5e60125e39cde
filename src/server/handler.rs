//! Dispatches `tools/*`, `resources/*`, and `prompts/*` JSON-RPC methods
//! onto the MCP adapter, wrapping each call with authorization and audit
//! logging (C8).

use std::sync::Arc;

use serde_json::Value;

use crate::envelope::ToolEnvelope;
use crate::protocol::{
    JsonRpcError, PromptsGetParams, PromptsGetResult, PromptsListResult, ResourcesListResult,
    ResourcesReadParams, ResourcesReadResult, ToolContent, ToolsCallParams, ToolsCallResult, ToolsListResult,
};
use crate::security::{wrap, AuditLogger, InputSanitizer, SecurityContext, TenantContext};
use crate::{McpError, McpResult};

use super::adapter::McpAdapter;

#[derive(Clone)]
pub struct McpRequestHandler {
    adapter: Arc<McpAdapter>,
    audit_logger: Arc<AuditLogger>,
}

impl McpRequestHandler {
    pub fn new(adapter: Arc<McpAdapter>, audit_logger: Arc<AuditLogger>) -> Self {
        Self { adapter, audit_logger }
    }

    fn tenant(security_ctx: &SecurityContext) -> TenantContext {
        security_ctx.tenant.clone().unwrap_or_else(TenantContext::default_tenant)
    }

    pub async fn handle_tools_list(&self, security_ctx: &SecurityContext) -> McpResult<Value> {
        let adapter = self.adapter.clone();
        let result = wrap(security_ctx, &self.audit_logger, "tools", "list", || async move {
            Ok(ToolsListResult { tools: adapter.list_tools().await, next_cursor: None })
        })
        .await?;
        Ok(serde_json::to_value(result)?)
    }

    pub async fn handle_tools_call(&self, params: Option<Value>, security_ctx: &SecurityContext) -> McpResult<Value> {
        let params: ToolsCallParams = serde_json::from_value(params.ok_or_else(|| McpError::InvalidParams {
            method: "tools/call".to_string(),
            details: "missing parameters".to_string(),
        })?)
        .map_err(|e| McpError::InvalidParams { method: "tools/call".to_string(), details: e.to_string() })?;

        let tenant = Self::tenant(security_ctx);
        let adapter = self.adapter.clone();
        let tool_name = params.name.clone();
        let outcome = wrap(security_ctx, &self.audit_logger, "tools", &format!("call:{tool_name}"), || async move {
            Ok(adapter.call_tool(&tenant, &params.name, params.arguments).await)
        })
        .await;

        // A permission denial must still reach the caller as a tool result
        // envelope, not only as a JSON-RPC-level error: the domain error is
        // recorded via the audit log above/below, but the response body the
        // client actually reads carries the `status: error` envelope.
        let result: ToolsCallResult = match outcome {
            Ok(result) => result,
            Err(McpError::AuthorizationDenied { reason }) => {
                let envelope = ToolEnvelope::error("AUTHORIZATION_DENIED", format!("Permission denied: {reason}"));
                ToolsCallResult {
                    content: vec![ToolContent::Text { text: envelope.to_pretty_json() }],
                    is_error: true,
                    metadata: Default::default(),
                }
            }
            Err(e) => return Err(e),
        };

        self.audit_logger.log_tool_execution(security_ctx.tenant_id(), &tool_name, !result.is_error).await;
        Ok(serde_json::to_value(result)?)
    }

    pub async fn handle_resources_list(&self, security_ctx: &SecurityContext) -> McpResult<Value> {
        let adapter = self.adapter.clone();
        let result = wrap(security_ctx, &self.audit_logger, "resources", "list", || async move {
            Ok(ResourcesListResult { resources: adapter.list_resources().await, next_cursor: None })
        })
        .await?;
        Ok(serde_json::to_value(result)?)
    }

    pub async fn handle_resources_read(&self, params: Option<Value>, security_ctx: &SecurityContext) -> McpResult<Value> {
        let params: ResourcesReadParams = serde_json::from_value(params.ok_or_else(|| McpError::InvalidParams {
            method: "resources/read".to_string(),
            details: "missing parameters".to_string(),
        })?)
        .map_err(|e| McpError::InvalidParams { method: "resources/read".to_string(), details: e.to_string() })?;

        InputSanitizer::validate_resource_uri(&params.uri)?;

        let tenant = Self::tenant(security_ctx);
        let adapter = self.adapter.clone();
        let uri = params.uri.clone();
        let result = wrap(security_ctx, &self.audit_logger, "resources", &format!("read:{uri}"), || async move {
            let contents = adapter.read_resource(&tenant, &uri).await?;
            Ok(ResourcesReadResult { contents })
        })
        .await?;
        Ok(serde_json::to_value(result)?)
    }

    pub async fn handle_prompts_list(&self, security_ctx: &SecurityContext) -> McpResult<Value> {
        let adapter = self.adapter.clone();
        let result = wrap(security_ctx, &self.audit_logger, "prompts", "list", || async move {
            Ok(PromptsListResult { prompts: adapter.list_prompts().await, next_cursor: None })
        })
        .await?;
        Ok(serde_json::to_value(result)?)
    }

    pub async fn handle_prompts_get(&self, params: Option<Value>, security_ctx: &SecurityContext) -> McpResult<Value> {
        let params: PromptsGetParams = serde_json::from_value(params.ok_or_else(|| McpError::InvalidParams {
            method: "prompts/get".to_string(),
            details: "missing parameters".to_string(),
        })?)
        .map_err(|e| McpError::InvalidParams { method: "prompts/get".to_string(), details: e.to_string() })?;

        let tenant = Self::tenant(security_ctx);
        let adapter = self.adapter.clone();
        let name = params.name.clone();
        let arguments = params
            .arguments
            .clone()
            .map(|m| serde_json::to_value(m).unwrap_or(Value::Null))
            .unwrap_or(Value::Null);
        let result: PromptsGetResult = wrap(security_ctx, &self.audit_logger, "prompts", &format!("get:{name}"), || async move {
            adapter.get_prompt(&tenant, &name, arguments).await
        })
        .await?;
        Ok(serde_json::to_value(result)?)
    }
}

impl From<McpError> for JsonRpcError {
    fn from(err: McpError) -> Self {
        match &err {
            McpError::MethodNotFound { method } => JsonRpcError::method_not_found(method),
            McpError::InvalidParams { details, .. } => JsonRpcError::invalid_params(details.clone()),
            McpError::Validation { message, .. } => JsonRpcError::invalid_params(message.clone()),
            McpError::AuthorizationDenied { reason } => {
                JsonRpcError::server_error(-32010, format!("authorization denied: {reason}"), None)
            }
            McpError::PluginInactive { .. } => {
                JsonRpcError::server_error(-32011, err.to_string(), None)
            }
            _ => JsonRpcError::internal_error(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::CapabilityRegistry;
    use crate::security::SecurityConfig;
    use std::sync::Arc as StdArc;

    fn handler() -> McpRequestHandler {
        let registry = StdArc::new(CapabilityRegistry::new(vec![]));
        let adapter = StdArc::new(McpAdapter::new(registry, vec![], vec![], vec![]));
        McpRequestHandler::new(adapter, StdArc::new(AuditLogger::new(false)))
    }

    #[tokio::test]
    async fn tools_list_with_no_modules_is_empty() {
        let handler = handler();
        let ctx = SecurityContext::anonymous(SecurityConfig::default());
        let value = handler.handle_tools_list(&ctx).await.unwrap();
        let result: ToolsListResult = serde_json::from_value(value).unwrap();
        assert!(result.tools.is_empty());
    }

    #[tokio::test]
    async fn unknown_tool_call_is_an_error_result() {
        let handler = handler();
        let ctx = SecurityContext::anonymous(SecurityConfig::default());
        let params = serde_json::json!({"name": "nonexistent.tool", "arguments": {}});
        let value = handler.handle_tools_call(Some(params), &ctx).await.unwrap();
        let result: ToolsCallResult = serde_json::from_value(value).unwrap();
        assert!(result.is_error);
    }

    #[tokio::test]
    async fn resources_read_rejects_traversal_uri() {
        let handler = handler();
        let ctx = SecurityContext::anonymous(SecurityConfig::default());
        let params = serde_json::json!({"uri": "../../etc/passwd"});
        let result = handler.handle_resources_read(Some(params), &ctx).await;
        assert!(result.is_err());
    }
}
