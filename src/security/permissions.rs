//! Tenant context, permission checks, auditing, and egress input validation.
//!
//! This is the C8 "Tenant/Auth Middleware" surface: every incoming request is
//! wrapped with an optional [`TenantContext`], and tool handlers are checked
//! against it via [`PermissionChecker`] before the handler itself runs.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::McpError;

/// Per-request identity and authorization scope.
///
/// `HasPermission("*")` is the super-token: a tenant holding it passes every
/// permission check regardless of resource/action. Expiry is enforced on
/// every check, not just at authentication time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantContext {
    pub tenant_id: String,
    pub user_id: String,
    pub permissions: HashSet<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    pub authenticated_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl TenantContext {
    /// The no-op default used when single-tenant mode has no authenticator
    /// configured: full access, no expiry.
    pub fn default_tenant() -> Self {
        Self {
            tenant_id: "default".to_string(),
            user_id: "default".to_string(),
            permissions: ["*".to_string()].into_iter().collect(),
            metadata: HashMap::new(),
            authenticated_at: Utc::now(),
            expires_at: None,
        }
    }

    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expiry) => Utc::now() > expiry,
            None => false,
        }
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        if self.is_expired() {
            return false;
        }
        self.permissions.contains("*") || self.permissions.contains(permission)
    }
}

/// Feature switch read from the `multi_tenant` configuration section.
#[derive(Debug, Clone, Default)]
pub struct SecurityConfig {
    pub multi_tenant_enabled: bool,
}

/// The per-request security context threaded through the dispatcher.
///
/// `tenant` is `None` in single-tenant mode (no token presented on an SSE
/// request, or stdio transport, which has no per-request identity at all).
#[derive(Debug, Clone)]
pub struct SecurityContext {
    pub tenant: Option<TenantContext>,
    pub config: SecurityConfig,
}

impl SecurityContext {
    pub fn new(tenant: Option<TenantContext>, config: SecurityConfig) -> Self {
        Self { tenant, config }
    }

    pub fn anonymous(config: SecurityConfig) -> Self {
        Self { tenant: None, config }
    }

    pub fn tenant_id(&self) -> &str {
        self.tenant.as_ref().map(|t| t.tenant_id.as_str()).unwrap_or("default")
    }

    pub fn user_id(&self) -> &str {
        self.tenant.as_ref().map(|t| t.user_id.as_str()).unwrap_or("default")
    }
}

/// Authorizes a resource/action pair against the request's tenant context.
pub struct PermissionChecker;

impl PermissionChecker {
    /// Single-tenant deployments (no tenant attached, or multi-tenant
    /// disabled) are permitted unconditionally — authorization only applies
    /// once a tenant has actually been established.
    pub fn check(ctx: &SecurityContext, resource: &str, action: &str) -> Result<(), McpError> {
        if !ctx.config.multi_tenant_enabled {
            return Ok(());
        }
        let Some(tenant) = &ctx.tenant else {
            return Ok(());
        };
        let permission = format!("{resource}:{action}");
        if tenant.has_permission(&permission) || tenant.has_permission(resource) {
            Ok(())
        } else {
            Err(McpError::authorization_denied(format!(
                "tenant '{}' lacks permission '{}' on '{}'",
                tenant.tenant_id, action, resource
            )))
        }
    }
}

/// Logs tenant/user/resource/action tuples at debug on success and warn on
/// denial, per the C8 contract. Disabled by default to avoid log spam in
/// single-tenant deployments with no audit requirement.
pub struct AuditLogger {
    enabled: bool,
}

impl AuditLogger {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub async fn log_authorization(
        &self,
        tenant_id: &str,
        user_id: &str,
        resource: &str,
        action: &str,
        allowed: bool,
    ) {
        if !self.enabled {
            return;
        }
        if allowed {
            tracing::debug!(tenant_id, user_id, resource, action, "authorization granted");
        } else {
            tracing::warn!(tenant_id, user_id, resource, action, "authorization denied");
        }
    }

    pub async fn log_tool_execution(&self, tenant_id: &str, tool_name: &str, success: bool) {
        if !self.enabled {
            return;
        }
        tracing::debug!(tenant_id, tool_name, success, "tool executed");
    }
}

/// Validates request-boundary strings that never reach a typed value object,
/// namely MCP resource URIs.
pub struct InputSanitizer;

impl InputSanitizer {
    pub fn validate_resource_uri(uri: &str) -> Result<(), McpError> {
        if uri.is_empty() {
            return Err(McpError::validation("uri", "resource URI must not be empty"));
        }
        if uri.contains("..") {
            return Err(McpError::validation("uri", "resource URI must not contain '..'"));
        }
        Ok(())
    }
}

/// Wraps a tool/resource/prompt dispatch with authorization and audit
/// logging: checks the permission, logs the decision, and only then (on
/// success) runs `action`.
pub async fn wrap<F, Fut, T>(
    ctx: &SecurityContext,
    logger: &AuditLogger,
    resource: &str,
    permission_action: &str,
    action: F,
) -> Result<T, McpError>
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = Result<T, McpError>>,
{
    let check = PermissionChecker::check(ctx, resource, permission_action);
    logger
        .log_authorization(ctx.tenant_id(), ctx.user_id(), resource, permission_action, check.is_ok())
        .await;
    check?;
    action().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn super_token_passes_any_permission() {
        let tenant = TenantContext::default_tenant();
        assert!(tenant.has_permission("apps:create"));
    }

    #[test]
    fn expired_tenant_fails_every_check() {
        let mut tenant = TenantContext::default_tenant();
        tenant.expires_at = Some(Utc::now() - chrono::Duration::seconds(1));
        assert!(!tenant.has_permission("*"));
        assert!(tenant.is_expired());
    }

    #[test]
    fn single_tenant_mode_permits_without_context() {
        let ctx = SecurityContext::anonymous(SecurityConfig::default());
        assert!(PermissionChecker::check(&ctx, "apps", "create").is_ok());
    }

    #[test]
    fn multi_tenant_denies_without_matching_permission() {
        let tenant = TenantContext {
            tenant_id: "acme".to_string(),
            user_id: "u1".to_string(),
            permissions: ["apps:list".to_string()].into_iter().collect(),
            metadata: HashMap::new(),
            authenticated_at: Utc::now(),
            expires_at: None,
        };
        let ctx = SecurityContext::new(
            Some(tenant),
            SecurityConfig { multi_tenant_enabled: true },
        );
        assert!(PermissionChecker::check(&ctx, "apps", "list").is_ok());
        assert!(PermissionChecker::check(&ctx, "apps", "create").is_err());
    }

    #[test]
    fn resource_uri_rejects_traversal() {
        assert!(InputSanitizer::validate_resource_uri("onboarding/../secret").is_err());
        assert!(InputSanitizer::validate_resource_uri("").is_err());
        assert!(InputSanitizer::validate_resource_uri("onboarding/quickstart").is_ok());
    }
}
