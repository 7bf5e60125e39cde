//! Derived application status, reading `apps:report`/`ps:report`.

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

use crate::capability::{CapabilityModule, ToolDescriptor, ToolProvider};
use crate::envelope::ToolEnvelope;
use crate::modules::{check_whitelist, derive_state, validate_app_name};
use crate::parser::parse_key_value;
use crate::security::TenantContext;
use crate::ssh::SshExecutor;

const MODULE_ID: &str = "status";
const WHITELIST: &[&str] = &["apps:report", "ps:report"];

pub struct StatusModule {
    executor: SshExecutor,
}

impl StatusModule {
    pub fn new(executor: SshExecutor) -> Self {
        Self { executor }
    }
}

impl CapabilityModule for StatusModule {
    fn id(&self) -> &str {
        MODULE_ID
    }
    fn name(&self) -> &str {
        "Status"
    }
    fn description(&self) -> &str {
        "Derived application status (exists/running/stopped/error)."
    }
    fn version(&self) -> &str {
        "1.0.0"
    }
}

#[async_trait]
impl ToolProvider for StatusModule {
    fn tools(&self) -> Vec<ToolDescriptor> {
        vec![ToolDescriptor {
            name: "status.get".to_string(),
            description: "Get the derived state of an application.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {"app_name": {"type": "string"}},
                "required": ["app_name"],
            }),
        }]
    }

    async fn call_tool(&self, _ctx: &TenantContext, name: &str, arguments: Value) -> ToolEnvelope {
        if name != "status.get" {
            return ToolEnvelope::error("METHOD_NOT_FOUND", format!("unknown tool '{name}'"));
        }
        let app_name = arguments.get("app_name").and_then(Value::as_str).unwrap_or("");
        if let Err(err) = validate_app_name(app_name) {
            return ToolEnvelope::from(&err);
        }
        if let Err(err) = check_whitelist(MODULE_ID, WHITELIST, "apps:report") {
            return ToolEnvelope::from(&err);
        }

        let cancel = CancellationToken::new();
        let report = match self.executor.execute_command(&cancel, "apps:report", &[app_name]).await {
            Ok(output) => output,
            Err(err) => return ToolEnvelope::from(&err),
        };
        let ps_report = self
            .executor
            .execute_command(&cancel, "ps:report", &[app_name])
            .await
            .unwrap_or_default();

        let mut fields = parse_key_value(&report, ':');
        fields.extend(parse_key_value(&ps_report, ':'));
        let state = derive_state(&fields);

        ToolEnvelope::ok(
            format!("'{app_name}' is {}", state.as_str()),
            Some(json!({"app_name": app_name, "state": state.as_str()})),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DokkuConfig;

    #[tokio::test]
    async fn rejects_invalid_app_name_before_ssh() {
        let module = StatusModule::new(SshExecutor::new(&DokkuConfig {
            host: "127.0.0.1".to_string(),
            port: 1,
            user: "dokku".to_string(),
            path: "dokku".to_string(),
            ssh_key_path: None,
            timeout: std::time::Duration::from_millis(200),
        }));
        let tenant = TenantContext::default_tenant();
        let env = module.call_tool(&tenant, "status.get", json!({"app_name": "Invalid_Name"})).await;
        assert_eq!(env.status, crate::envelope::EnvelopeStatus::Error);
    }
}
