//! Application lifecycle: create, destroy, deploy, rollback, cancel, scale.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::capability::{CapabilityModule, ToolDescriptor, ToolProvider};
use crate::deployment::{self, Deployment, DeploymentRepository};
use crate::envelope::ToolEnvelope;
use crate::error::McpError;
use crate::modules::{check_whitelist, validate_app_name};
use crate::security::TenantContext;
use crate::ssh::SshExecutor;

const MODULE_ID: &str = "apps";
const WHITELIST: &[&str] = &[
    "apps:list",
    "apps:info",
    "apps:create",
    "apps:destroy",
    "apps:exists",
    "apps:report",
    "config:show",
    "config:set",
    "ps:scale",
    "ps:report",
    "logs",
];

pub struct AppsModule {
    executor: SshExecutor,
    repo: Arc<DeploymentRepository>,
}

impl AppsModule {
    pub fn new(executor: SshExecutor, repo: Arc<DeploymentRepository>) -> Self {
        Self { executor, repo }
    }

    async fn run(&self, cancel: &CancellationToken, command: &str, args: &[&str]) -> Result<String, ToolEnvelope> {
        check_whitelist(MODULE_ID, WHITELIST, command).map_err(|e| ToolEnvelope::from(&e))?;
        self.executor
            .execute_command(cancel, command, args)
            .await
            .map_err(|e| ToolEnvelope::from(&e))
    }

    fn require_app_name(args: &Value) -> Result<String, ToolEnvelope> {
        let name = args.get("app_name").and_then(Value::as_str).unwrap_or("");
        validate_app_name(name).map_err(|e| ToolEnvelope::from(&e))?;
        Ok(name.to_string())
    }

    fn deployment_envelope(result: Result<Deployment, McpError>) -> ToolEnvelope {
        match result {
            Ok(deployment) => ToolEnvelope::ok(
                format!("deployment {} for '{}' is {:?}", deployment.id, deployment.app_name, deployment.status),
                serde_json::to_value(&deployment).ok(),
            ),
            Err(err) => ToolEnvelope::from(&err),
        }
    }
}

impl CapabilityModule for AppsModule {
    fn id(&self) -> &str {
        MODULE_ID
    }
    fn name(&self) -> &str {
        "Applications"
    }
    fn description(&self) -> &str {
        "Application lifecycle: create, destroy, deploy, rollback, scale."
    }
    fn version(&self) -> &str {
        "1.0.0"
    }
}

#[async_trait]
impl ToolProvider for AppsModule {
    fn tools(&self) -> Vec<ToolDescriptor> {
        vec![
            ToolDescriptor {
                name: "apps.list".to_string(),
                description: "List all applications on the Dokku host.".to_string(),
                input_schema: json!({"type": "object", "properties": {}}),
            },
            ToolDescriptor {
                name: "apps.create".to_string(),
                description: "Create a new application.".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {"app_name": {"type": "string"}},
                    "required": ["app_name"],
                }),
            },
            ToolDescriptor {
                name: "apps.destroy".to_string(),
                description: "Destroy an application and all of its data.".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {"app_name": {"type": "string"}},
                    "required": ["app_name"],
                }),
            },
            ToolDescriptor {
                name: "apps.deploy".to_string(),
                description: "Deploy a git ref to an application, creating it if absent.".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "app_name": {"type": "string"},
                        "git_ref": {"type": "string"},
                        "buildpack": {"type": "string"},
                    },
                    "required": ["app_name", "git_ref"],
                }),
            },
            ToolDescriptor {
                name: "apps.rollback".to_string(),
                description: "Roll back to a previous successful deployment.".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {"deployment_id": {"type": "string"}},
                    "required": ["deployment_id"],
                }),
            },
            ToolDescriptor {
                name: "apps.cancel".to_string(),
                description: "Cancel an in-progress deployment.".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {"deployment_id": {"type": "string"}},
                    "required": ["deployment_id"],
                }),
            },
            ToolDescriptor {
                name: "apps.scale".to_string(),
                description: "Set process scale, e.g. web=2.".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {"app_name": {"type": "string"}, "scale": {"type": "string"}},
                    "required": ["app_name", "scale"],
                }),
            },
        ]
    }

    async fn call_tool(&self, _ctx: &TenantContext, name: &str, arguments: Value) -> ToolEnvelope {
        let cancel = CancellationToken::new();
        match name {
            "apps.list" => match self.run(&cancel, "apps:list", &[]).await {
                Ok(output) => ToolEnvelope::ok("apps listed", Some(json!({"raw": output}))),
                Err(env) => env,
            },
            "apps.create" => {
                let app_name = match Self::require_app_name(&arguments) {
                    Ok(n) => n,
                    Err(env) => return env,
                };
                match self.run(&cancel, "apps:create", &[&app_name]).await {
                    Ok(_) => ToolEnvelope::ok(format!("created '{app_name}'"), None),
                    Err(env) => env,
                }
            }
            "apps.destroy" => {
                let app_name = match Self::require_app_name(&arguments) {
                    Ok(n) => n,
                    Err(env) => return env,
                };
                match self.run(&cancel, "apps:destroy", &[&app_name, "--force"]).await {
                    Ok(_) => ToolEnvelope::ok(format!("destroyed '{app_name}'"), None),
                    Err(env) => env,
                }
            }
            "apps.deploy" => {
                let app_name = arguments.get("app_name").and_then(Value::as_str).unwrap_or("");
                let git_ref = arguments.get("git_ref").and_then(Value::as_str).unwrap_or("");
                let buildpack = arguments.get("buildpack").and_then(Value::as_str);
                let result = deployment::deploy(&self.repo, &self.executor, &cancel, app_name, git_ref, buildpack).await;
                Self::deployment_envelope(result)
            }
            "apps.rollback" => {
                let id = match arguments.get("deployment_id").and_then(Value::as_str).and_then(|s| Uuid::parse_str(s).ok()) {
                    Some(id) => id,
                    None => return ToolEnvelope::error("VALIDATION_DEPLOYMENT_ID", "deployment_id must be a valid uuid"),
                };
                let result = deployment::rollback(&self.repo, &self.executor, &cancel, id).await;
                Self::deployment_envelope(result)
            }
            "apps.cancel" => {
                let id = match arguments.get("deployment_id").and_then(Value::as_str).and_then(|s| Uuid::parse_str(s).ok()) {
                    Some(id) => id,
                    None => return ToolEnvelope::error("VALIDATION_DEPLOYMENT_ID", "deployment_id must be a valid uuid"),
                };
                Self::deployment_envelope(deployment::cancel(&self.repo, id))
            }
            "apps.scale" => {
                let app_name = match Self::require_app_name(&arguments) {
                    Ok(n) => n,
                    Err(env) => return env,
                };
                let scale = arguments.get("scale").and_then(Value::as_str).unwrap_or("");
                if scale.is_empty() {
                    return ToolEnvelope::error("VALIDATION_SCALE", "scale must not be empty");
                }
                match self.run(&cancel, "ps:scale", &[&app_name, scale]).await {
                    Ok(_) => ToolEnvelope::ok(format!("scaled '{app_name}' to {scale}"), None),
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

    fn module() -> AppsModule {
        AppsModule::new(
            SshExecutor::new(&DokkuConfig {
                host: "127.0.0.1".to_string(),
                port: 1,
                user: "dokku".to_string(),
                path: "dokku".to_string(),
                ssh_key_path: None,
                timeout: std::time::Duration::from_millis(200),
            }),
            Arc::new(DeploymentRepository::new()),
        )
    }

    #[tokio::test]
    async fn create_with_empty_name_never_reaches_ssh() {
        let module = module();
        let tenant = TenantContext::default_tenant();
        let env = module.call_tool(&tenant, "apps.create", json!({"app_name": ""})).await;
        assert_eq!(env.status, crate::envelope::EnvelopeStatus::Error);
        assert_eq!(env.code.as_deref(), Some("VALIDATION_APP_NAME"));
    }
}
