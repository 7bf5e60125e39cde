//! Cross-module scenarios exercising the capability registry, the MCP
//! adapter, and the request handler wired together the way
//! `LifecycleCoordinator::bootstrap` assembles them, rather than any one
//! module in isolation.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dokku_mcp::capability::{CapabilityModule, ToolDescriptor, ToolProvider};
use dokku_mcp::config::DokkuConfig;
use dokku_mcp::envelope::{EnvelopeStatus, ToolEnvelope};
use dokku_mcp::security::{AuditLogger, SecurityContext, TenantContext};
use dokku_mcp::server::adapter::McpAdapter;
use dokku_mcp::server::handler::McpRequestHandler;
use dokku_mcp::ssh::SshExecutor;
use dokku_mcp::CapabilityRegistry;
use serde_json::json;
use tokio_util::sync::CancellationToken;

struct CoreModule;

impl CapabilityModule for CoreModule {
    fn id(&self) -> &str {
        "core"
    }
    fn name(&self) -> &str {
        "Core"
    }
    fn description(&self) -> &str {
        "always-on lifecycle tool, no plugin dependency"
    }
    fn version(&self) -> &str {
        "1.0.0"
    }
}

#[async_trait]
impl ToolProvider for CoreModule {
    fn tools(&self) -> Vec<ToolDescriptor> {
        vec![ToolDescriptor {
            name: "core.ping".to_string(),
            description: "always-available liveness check".to_string(),
            input_schema: json!({"type": "object", "properties": {}}),
        }]
    }

    async fn call_tool(&self, _ctx: &TenantContext, name: &str, _arguments: serde_json::Value) -> ToolEnvelope {
        match name {
            "core.ping" => ToolEnvelope::ok("pong", None),
            other => ToolEnvelope::error("METHOD_NOT_FOUND", format!("unknown tool '{other}'")),
        }
    }
}

struct PostgresModule;

impl CapabilityModule for PostgresModule {
    fn id(&self) -> &str {
        "postgres"
    }
    fn name(&self) -> &str {
        "Postgres"
    }
    fn description(&self) -> &str {
        "gated behind the postgres Dokku plugin"
    }
    fn version(&self) -> &str {
        "1.0.0"
    }
    fn dokku_plugin_name(&self) -> Option<&str> {
        Some("postgres")
    }
}

#[async_trait]
impl ToolProvider for PostgresModule {
    fn tools(&self) -> Vec<ToolDescriptor> {
        vec![ToolDescriptor {
            name: "postgres.create".to_string(),
            description: "create a postgres service".to_string(),
            input_schema: json!({"type": "object", "properties": {}}),
        }]
    }

    async fn call_tool(&self, _ctx: &TenantContext, _name: &str, _arguments: serde_json::Value) -> ToolEnvelope {
        ToolEnvelope::ok("created", None)
    }
}

/// An executor pointed at a closed local port, so `execute_command` fails
/// fast instead of hanging on an unreachable remote host.
fn unreachable_executor() -> SshExecutor {
    SshExecutor::new(&DokkuConfig {
        host: "127.0.0.1".to_string(),
        port: 1,
        user: "dokku".to_string(),
        path: "dokku".to_string(),
        ssh_key_path: None,
        timeout: Duration::from_millis(300),
    })
}

/// Scenario: a module with no Dokku plugin dependency activates without any
/// reachable remote host, and is the only module `tools/list` advertises.
#[tokio::test]
async fn core_module_activates_without_remote() {
    let core = Arc::new(CoreModule);
    let registry = Arc::new(CapabilityRegistry::new(vec![core.clone() as _]));

    let executor = unreachable_executor();
    let cancel = CancellationToken::new();
    registry.sync(&executor, &cancel).await;

    assert!(registry.is_active("core").await);
    assert_eq!(registry.get_active_modules().await.len(), 1);

    let adapter = Arc::new(McpAdapter::new(registry, vec![core as _], vec![], vec![]));
    let tools = adapter.list_tools().await;
    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0].name, "core.ping");
}

/// Scenario: a plugin-gated module stays inactive while its Dokku plugin is
/// unreachable/undiscovered, and its tool is rejected with `PLUGIN_INACTIVE`
/// at dispatch rather than silently omitted from the surface contract.
#[tokio::test]
async fn plugin_gated_module_rejects_dispatch_while_inactive() {
    let postgres = Arc::new(PostgresModule);
    let registry = Arc::new(CapabilityRegistry::new(vec![postgres.clone() as _]));

    let executor = unreachable_executor();
    let cancel = CancellationToken::new();
    registry.sync(&executor, &cancel).await;
    assert!(!registry.is_active("postgres").await);

    let adapter = Arc::new(McpAdapter::new(registry, vec![postgres as _], vec![], vec![]));
    let tenant = TenantContext::default_tenant();
    let result = adapter.call_tool(&tenant, "postgres.create", Some(json!({}))).await;
    assert!(result.is_error);
    let text = match &result.content[0] {
        dokku_mcp::protocol::ToolContent::Text { text } => text.clone(),
        _ => String::new(),
    };
    assert!(text.contains("PLUGIN_INACTIVE") || text.contains("inactive"));
}

/// Scenario: a tool call that fails validation returns an error envelope
/// through the full handler stack, never reaching the SSH executor (the
/// unreachable host would otherwise make this test hang or time out).
#[tokio::test]
async fn validation_failure_never_reaches_ssh_through_full_stack() {
    use dokku_mcp::deployment::DeploymentRepository;
    use dokku_mcp::modules::apps::AppsModule;

    let apps = Arc::new(AppsModule::new(unreachable_executor(), Arc::new(DeploymentRepository::new())));
    let registry = Arc::new(CapabilityRegistry::new(vec![apps.clone() as _]));
    // `apps` has no Dokku plugin dependency, but still starts inactive until
    // the first sync — run it so the call below reaches the module's own
    // validation instead of being rejected as PLUGIN_INACTIVE.
    registry.sync(&unreachable_executor(), &CancellationToken::new()).await;
    let adapter = Arc::new(McpAdapter::new(registry, vec![apps as _], vec![], vec![]));
    let handler = McpRequestHandler::new(adapter, Arc::new(AuditLogger::new(false)));

    let ctx = SecurityContext::anonymous(Default::default());
    let params = json!({"name": "apps.create", "arguments": {"app_name": ""}});

    let started = std::time::Instant::now();
    let value = handler.handle_tools_call(Some(params), &ctx).await.unwrap();
    // The unreachable host's timeout is 300ms; finishing well under that
    // proves validation short-circuited before any SSH dispatch.
    assert!(started.elapsed() < Duration::from_millis(200));

    let result: dokku_mcp::protocol::ToolsCallResult = serde_json::from_value(value).unwrap();
    assert!(result.is_error);
    let text = match &result.content[0] {
        dokku_mcp::protocol::ToolContent::Text { text } => text.clone(),
        _ => String::new(),
    };
    assert!(text.contains("VALIDATION_APP_NAME"));
}

/// Envelope round-trip (C7): every field survives a serialize/deserialize
/// cycle unchanged, which the wire transport relies on implicitly.
#[test]
fn tool_envelope_round_trips_through_json() {
    let envelope = ToolEnvelope::ok("created 'myapp'", Some(json!({"app_name": "myapp"})))
        .with_request_id("req-123")
        .with_hint("use apps.info to check status")
        .with_links(vec![dokku_mcp::envelope::Link::new(
            "next",
            "apps.info",
            json!({"app_name": "myapp"}),
        )]);

    let json_str = envelope.to_pretty_json();
    let round_tripped: ToolEnvelope = serde_json::from_str(&json_str).unwrap();

    assert_eq!(round_tripped.status, EnvelopeStatus::Ok);
    assert_eq!(round_tripped.message, envelope.message);
    assert_eq!(round_tripped.data, envelope.data);
    assert_eq!(round_tripped.request_id.as_deref(), Some("req-123"));
    assert_eq!(round_tripped.hint.as_deref(), Some("use apps.info to check status"));
    assert_eq!(round_tripped.links, envelope.links);
}
