//! Tenant authentication for the SSE transport: resolves an opaque bearer
//! token into a [`TenantContext`]. No-op by default so single-tenant
//! deployments need no configuration at all.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;

use super::permissions::TenantContext;
use crate::McpError;

/// Authentication result
pub type AuthResult<T> = Result<T, AuthError>;

/// Authentication error
#[derive(Debug, Clone, thiserror::Error)]
pub enum AuthError {
    #[error("invalid or unknown token")]
    InvalidCredentials,

    #[error("token expired")]
    TokenExpired,

    #[error("authentication required")]
    AuthenticationRequired,
}

impl From<AuthError> for McpError {
    fn from(err: AuthError) -> Self {
        McpError::authentication_failed(err.to_string())
    }
}

/// A collaborator that resolves an opaque token into a tenant identity.
///
/// The server does not prescribe a token format; implementations may back
/// this with a static table, a database, or a remote identity provider.
#[async_trait]
pub trait TenantAuthenticator: Send + Sync {
    async fn authenticate(&self, token: &str) -> AuthResult<TenantContext>;
}

/// The no-op authenticator: every token (including none) resolves to the
/// full-access default tenant. This is what single-tenant deployments run
/// with when no authenticator is configured.
pub struct NoopAuthenticator;

#[async_trait]
impl TenantAuthenticator for NoopAuthenticator {
    async fn authenticate(&self, _token: &str) -> AuthResult<TenantContext> {
        Ok(TenantContext::default_tenant())
    }
}

/// A static table of bearer tokens to tenant contexts, suitable for small
/// multi-tenant deployments configured entirely from a config file.
pub struct StaticTokenAuthenticator {
    tokens: HashMap<String, TenantContext>,
}

impl StaticTokenAuthenticator {
    pub fn new(tokens: HashMap<String, TenantContext>) -> Self {
        Self { tokens }
    }
}

#[async_trait]
impl TenantAuthenticator for StaticTokenAuthenticator {
    async fn authenticate(&self, token: &str) -> AuthResult<TenantContext> {
        let tenant = self.tokens.get(token).ok_or(AuthError::InvalidCredentials)?;
        if tenant.is_expired() {
            return Err(AuthError::TokenExpired);
        }
        Ok(tenant.clone())
    }
}

/// Extracts a bearer token from the SSE request's `?token=` query parameter
/// or `Authorization: Bearer …` header, preferring the query parameter.
pub fn extract_token(query_token: Option<&str>, auth_header: Option<&str>) -> Option<String> {
    if let Some(token) = query_token {
        if !token.is_empty() {
            return Some(token.to_string());
        }
    }
    auth_header.and_then(|h| h.strip_prefix("Bearer ")).map(str::to_string)
}

/// Wraps a [`TenantAuthenticator`] and resolves per-request tenant context.
///
/// Absence of a token is single-tenant mode: no tenant context is attached
/// and downstream authorization checks are skipped (see
/// [`super::permissions::PermissionChecker`]).
pub struct TenantAuthManager {
    authenticator: std::sync::Arc<dyn TenantAuthenticator>,
}

impl TenantAuthManager {
    pub fn new(authenticator: std::sync::Arc<dyn TenantAuthenticator>) -> Self {
        Self { authenticator }
    }

    pub fn noop() -> Self {
        Self::new(std::sync::Arc::new(NoopAuthenticator))
    }

    pub async fn authenticate(&self, token: Option<&str>) -> AuthResult<Option<TenantContext>> {
        match token {
            Some(t) => Ok(Some(self.authenticator.authenticate(t).await?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn noop_authenticator_grants_full_access() {
        let manager = TenantAuthManager::noop();
        let tenant = manager.authenticate(Some("anything")).await.unwrap().unwrap();
        assert_eq!(tenant.tenant_id, "default");
        assert!(tenant.has_permission("apps:create"));
    }

    #[tokio::test]
    async fn missing_token_is_single_tenant_mode() {
        let manager = TenantAuthManager::noop();
        let tenant = manager.authenticate(None).await.unwrap();
        assert!(tenant.is_none());
    }

    #[tokio::test]
    async fn static_token_rejects_unknown_token() {
        let mut tokens = HashMap::new();
        tokens.insert("good-token".to_string(), TenantContext::default_tenant());
        let manager = TenantAuthManager::new(std::sync::Arc::new(StaticTokenAuthenticator::new(tokens)));

        assert!(manager.authenticate(Some("good-token")).await.unwrap().is_some());
        assert!(manager.authenticate(Some("bad-token")).await.is_err());
    }

    #[test]
    fn extract_token_prefers_query_param() {
        assert_eq!(
            extract_token(Some("q"), Some("Bearer h")),
            Some("q".to_string())
        );
        assert_eq!(extract_token(None, Some("Bearer h")), Some("h".to_string()));
        assert_eq!(extract_token(None, None), None);
        assert_eq!(extract_token(None, Some("Basic h")), None);
    }

    #[tokio::test]
    async fn expired_static_token_is_rejected() {
        let mut tenant = TenantContext::default_tenant();
        tenant.expires_at = Some(Utc::now() - chrono::Duration::seconds(1));
        let mut tokens = HashMap::new();
        tokens.insert("stale".to_string(), tenant);
        let manager = TenantAuthManager::new(std::sync::Arc::new(StaticTokenAuthenticator::new(tokens)));
        assert!(manager.authenticate(Some("stale")).await.is_err());
    }
}