//! Domain management and TLS provisioning.

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

use crate::capability::{CapabilityModule, ToolDescriptor, ToolProvider};
use crate::envelope::ToolEnvelope;
use crate::modules::{check_whitelist, validate_app_name};
use crate::security::TenantContext;
use crate::ssh::SshExecutor;

const MODULE_ID: &str = "domains";
const WHITELIST: &[&str] = &[
    "domains:report",
    "domains:add-global",
    "domains:remove-global",
    "domains:set-global",
    "domains:clear-global",
    "letsencrypt:set",
];

pub struct DomainsModule {
    executor: SshExecutor,
}

impl DomainsModule {
    pub fn new(executor: SshExecutor) -> Self {
        Self { executor }
    }

    async fn run(&self, command: &str, args: &[&str]) -> Result<String, ToolEnvelope> {
        check_whitelist(MODULE_ID, WHITELIST, command).map_err(|e| ToolEnvelope::from(&e))?;
        let cancel = CancellationToken::new();
        self.executor
            .execute_command(&cancel, command, args)
            .await
            .map_err(|e| ToolEnvelope::from(&e))
    }
}

impl CapabilityModule for DomainsModule {
    fn id(&self) -> &str {
        MODULE_ID
    }
    fn name(&self) -> &str {
        "Domains"
    }
    fn description(&self) -> &str {
        "Manage global and per-app domains, and enable TLS."
    }
    fn version(&self) -> &str {
        "1.0.0"
    }
}

#[async_trait]
impl ToolProvider for DomainsModule {
    fn tools(&self) -> Vec<ToolDescriptor> {
        vec![
            ToolDescriptor {
                name: "domains.report".to_string(),
                description: "Report configured domains.".to_string(),
                input_schema: json!({"type": "object", "properties": {}}),
            },
            ToolDescriptor {
                name: "domains.add".to_string(),
                description: "Add a global domain.".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {"domain": {"type": "string"}},
                    "required": ["domain"],
                }),
            },
            ToolDescriptor {
                name: "domains.remove".to_string(),
                description: "Remove a global domain.".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {"domain": {"type": "string"}},
                    "required": ["domain"],
                }),
            },
            ToolDescriptor {
                name: "domains.clear".to_string(),
                description: "Clear all global domains.".to_string(),
                input_schema: json!({"type": "object", "properties": {}}),
            },
            ToolDescriptor {
                name: "tls.enable".to_string(),
                description: "Enable Let's Encrypt TLS for an application.".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {"app_name": {"type": "string"}},
                    "required": ["app_name"],
                }),
            },
        ]
    }

    async fn call_tool(&self, _ctx: &TenantContext, name: &str, arguments: Value) -> ToolEnvelope {
        match name {
            "domains.report" => match self.run("domains:report", &[]).await {
                Ok(output) => ToolEnvelope::ok("domains reported", Some(json!({"raw": output}))),
                Err(env) => env,
            },
            "domains.add" => {
                let domain = arguments.get("domain").and_then(Value::as_str).unwrap_or("");
                if domain.is_empty() {
                    return ToolEnvelope::error("VALIDATION_DOMAIN", "domain must not be empty");
                }
                match self.run("domains:add-global", &[domain]).await {
                    Ok(_) => ToolEnvelope::ok(format!("added domain '{domain}'"), None),
                    Err(env) => env,
                }
            }
            "domains.remove" => {
                let domain = arguments.get("domain").and_then(Value::as_str).unwrap_or("");
                if domain.is_empty() {
                    return ToolEnvelope::error("VALIDATION_DOMAIN", "domain must not be empty");
                }
                match self.run("domains:remove-global", &[domain]).await {
                    Ok(_) => ToolEnvelope::ok(format!("removed domain '{domain}'"), None),
                    Err(env) => env,
                }
            }
            "domains.clear" => match self.run("domains:clear-global", &[]).await {
                Ok(_) => ToolEnvelope::ok("cleared all global domains", None),
                Err(env) => env,
            },
            "tls.enable" => {
                let app_name = arguments.get("app_name").and_then(Value::as_str).unwrap_or("");
                if let Err(err) = validate_app_name(app_name) {
                    return ToolEnvelope::from(&err);
                }
                match self.run("letsencrypt:set", &[app_name, "email", "ops@example.com"]).await {
                    Ok(_) => ToolEnvelope::ok(format!("enabled TLS for '{app_name}'"), None),
                    Err(env) => env,
                }
            }
            other => ToolEnvelope::error("METHOD_NOT_FOUND", format!("unknown tool '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DokkuConfig;

    #[tokio::test]
    async fn add_domain_with_empty_value_never_reaches_ssh() {
        let module = DomainsModule::new(SshExecutor::new(&DokkuConfig {
            host: "127.0.0.1".to_string(),
            port: 1,
            user: "dokku".to_string(),
            path: "dokku".to_string(),
            ssh_key_path: None,
            timeout: std::time::Duration::from_millis(200),
        }));
        let tenant = TenantContext::default_tenant();
        let env = module.call_tool(&tenant, "domains.add", json!({"domain": ""})).await;
        assert_eq!(env.code.as_deref(), Some("VALIDATION_DOMAIN"));
    }
}
