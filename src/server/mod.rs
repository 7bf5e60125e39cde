//! MCP server: JSON-RPC dispatch over stdio or SSE, sitting on top of the
//! capability adapter (C6) and tenant/auth middleware (C8).

pub mod adapter;
pub mod handler;

pub use adapter::{AdapterCapabilitySource, McpAdapter};
pub use handler::McpRequestHandler;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;

use crate::config::DokkuMcpConfig;
use crate::protocol::{
    InitializeParams, InitializeResult, JsonRpcError, JsonRpcRequest, JsonRpcResponse,
    ServerCapabilities, ServerInfo,
};
use crate::security::{AuditLogger, SecurityConfig, SecurityContext, TenantAuthManager};
use crate::{McpError, McpResult};

/// The MCP server proper: owns no business logic of its own, only the
/// JSON-RPC envelope, transport loop, and per-request auth resolution. All
/// dispatch is delegated to [`McpRequestHandler`].
#[derive(Clone)]
pub struct McpServer {
    config: DokkuMcpConfig,
    handler: McpRequestHandler,
    auth_manager: Arc<TenantAuthManager>,
    security_config: SecurityConfig,
    initialized: Arc<RwLock<bool>>,
}

impl McpServer {
    pub fn new(
        config: DokkuMcpConfig,
        adapter: Arc<McpAdapter>,
        auth_manager: Arc<TenantAuthManager>,
        audit_logger: Arc<AuditLogger>,
        security_config: SecurityConfig,
    ) -> Self {
        Self {
            config,
            handler: McpRequestHandler::new(adapter, audit_logger),
            auth_manager,
            security_config,
            initialized: Arc::new(RwLock::new(false)),
        }
    }

    /// Reads newline-delimited JSON-RPC requests from stdin and writes
    /// responses to stdout. Stdio has no per-connection identity, so every
    /// request authenticates with no token (single-tenant, or the default
    /// tenant if a static table happens to accept an empty token).
    pub async fn run_stdio(&self) -> McpResult<()> {
        use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

        tracing::info!("starting MCP server on stdio");
        let stdin = tokio::io::stdin();
        let mut stdout = tokio::io::stdout();
        let mut reader = BufReader::new(stdin);
        let mut line = String::new();

        loop {
            line.clear();
            match reader.read_line(&mut line).await {
                Ok(0) => {
                    tracing::info!("stdin closed, shutting down");
                    break;
                }
                Ok(_) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    if let Some(response) = self.handle_message(trimmed, None).await? {
                        let response_json = serde_json::to_string(&response)?;
                        stdout.write_all(response_json.as_bytes()).await?;
                        stdout.write_all(b"\n").await?;
                        stdout.flush().await?;
                    }
                }
                Err(e) => {
                    tracing::error!("error reading stdin: {e}");
                    break;
                }
            }
        }
        Ok(())
    }

    /// Stands up the SSE/HTTP transport on `transport.host:port`, applying
    /// the configured CORS policy and the documented 30s graceful-shutdown
    /// deadline on SIGINT/SIGTERM.
    pub async fn run_sse(&self) -> McpResult<()> {
        use axum::extract::{Query, State};
        use axum::http::{HeaderMap, Method};
        use axum::routing::{get, post};
        use axum::{Json, Router};
        use tower_http::cors::{AllowOrigin, CorsLayer};

        #[derive(serde::Deserialize)]
        struct TokenQuery {
            token: Option<String>,
        }

        async fn health() -> Json<serde_json::Value> {
            Json(serde_json::json!({"status": "healthy", "service": "dokku-mcp", "version": env!("CARGO_PKG_VERSION")}))
        }

        async fn handle_rpc(
            State(server): State<McpServer>,
            Query(query): Query<TokenQuery>,
            headers: HeaderMap,
            body: String,
        ) -> axum::response::Response {
            use axum::response::IntoResponse;

            let auth_header = headers.get("authorization").and_then(|h| h.to_str().ok());
            let token = crate::security::extract_token(query.token.as_deref(), auth_header);

            match server.handle_message(&body, token.as_deref()).await {
                Ok(Some(response)) => Json(response).into_response(),
                Ok(None) => axum::http::StatusCode::ACCEPTED.into_response(),
                Err(e) => {
                    let response = JsonRpcResponse::error(JsonRpcError::from(e), None);
                    Json(response).into_response()
                }
            }
        }

        let bind_address = format!("{}:{}", self.config.transport.host, self.config.transport.port);
        let cors_config = self.config.transport.cors.clone();
        let cors = if cors_config.enabled {
            let predicate_config = cors_config.clone();
            let methods: Vec<Method> = cors_config
                .allowed_methods
                .iter()
                .filter_map(|m| m.parse().ok())
                .collect();
            let headers: Vec<axum::http::HeaderName> = cors_config
                .allowed_headers
                .iter()
                .filter_map(|h| h.parse().ok())
                .collect();
            CorsLayer::new()
                .allow_origin(AllowOrigin::predicate(move |origin, _| {
                    origin.to_str().map(|o| predicate_config.allows_origin(o)).unwrap_or(false)
                }))
                .allow_methods(methods)
                .allow_headers(headers)
                .max_age(Duration::from_secs(cors_config.max_age))
        } else {
            CorsLayer::new()
        };

        let app = Router::new()
            .route("/", post(handle_rpc))
            .route("/health", get(health))
            .layer(cors)
            .with_state(self.clone());

        tracing::info!("starting MCP server on {bind_address} (SSE transport)");
        let listener = tokio::net::TcpListener::bind(&bind_address)
            .await
            .map_err(|e| McpError::connection_failed(format!("failed to bind {bind_address}: {e}")))?;

        let serve = axum::serve(listener, app.into_make_service()).with_graceful_shutdown(shutdown_signal());
        match tokio::time::timeout(Duration::from_secs(30), serve).await {
            Ok(result) => result.map_err(|e| McpError::ServerError { message: e.to_string() }),
            Err(_) => {
                tracing::warn!("graceful shutdown deadline (30s) elapsed, forcing exit");
                Ok(())
            }
        }
    }

    /// Parses one JSON-RPC message and dispatches it; returns `None` for
    /// notifications, which never produce a response.
    pub async fn handle_message(&self, message: &str, token: Option<&str>) -> McpResult<Option<JsonRpcResponse>> {
        let request: JsonRpcRequest = serde_json::from_str(message)
            .map_err(|e| McpError::InvalidJsonRpc { details: e.to_string() })?;
        self.handle_request(request, token).await
    }

    async fn handle_request(&self, request: JsonRpcRequest, token: Option<&str>) -> McpResult<Option<JsonRpcResponse>> {
        if request.is_notification() {
            self.handle_notification(request).await?;
            return Ok(None);
        }

        let request_id = request.id.clone();
        match self.process_request(request, token).await {
            Ok(result) => Ok(Some(JsonRpcResponse::success(result, request_id))),
            Err(e) => Ok(Some(JsonRpcResponse::error(JsonRpcError::from(e), request_id))),
        }
    }

    async fn process_request(&self, request: JsonRpcRequest, token: Option<&str>) -> McpResult<serde_json::Value> {
        if request.method != "initialize" {
            let initialized = *self.initialized.read().await;
            if !initialized {
                return Err(McpError::protocol("server not initialized; send 'initialize' first"));
            }
        }

        if request.method == "initialize" {
            let params: InitializeParams = serde_json::from_value(request.params.ok_or_else(|| McpError::InvalidParams {
                method: "initialize".to_string(),
                details: "missing parameters".to_string(),
            })?)?;
            let result = self.handle_initialize(params).await?;
            return Ok(serde_json::to_value(result)?);
        }

        let security_ctx = self.authenticate(token).await?;
        match request.method.as_str() {
            "tools/list" => self.handler.handle_tools_list(&security_ctx).await,
            "tools/call" => self.handler.handle_tools_call(request.params, &security_ctx).await,
            "resources/list" => self.handler.handle_resources_list(&security_ctx).await,
            "resources/read" => self.handler.handle_resources_read(request.params, &security_ctx).await,
            "prompts/list" => self.handler.handle_prompts_list(&security_ctx).await,
            "prompts/get" => self.handler.handle_prompts_get(request.params, &security_ctx).await,
            method => Err(McpError::MethodNotFound { method: method.to_string() }),
        }
    }

    async fn handle_notification(&self, request: JsonRpcRequest) -> McpResult<()> {
        match request.method.as_str() {
            "initialized" => {
                let mut initialized = self.initialized.write().await;
                *initialized = true;
                tracing::info!("MCP server initialized");
            }
            "notifications/cancelled" => {
                tracing::debug!("received cancellation notification");
            }
            method => tracing::warn!("unknown notification method: {method}"),
        }
        Ok(())
    }

    async fn handle_initialize(&self, params: InitializeParams) -> McpResult<InitializeResult> {
        if !crate::protocol::validate_protocol_version(&params.protocol_version) {
            return Err(McpError::protocol(format!(
                "unsupported protocol version: {}",
                params.protocol_version
            )));
        }

        {
            let mut initialized = self.initialized.write().await;
            *initialized = true;
        }

        Ok(InitializeResult {
            protocol_version: params.protocol_version,
            capabilities: ServerCapabilities::default(),
            server_info: ServerInfo {
                name: "dokku-mcp".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                metadata: HashMap::new(),
            },
        })
    }

    /// Resolves the bearer token (if any) into a tenant context. Authorization
    /// of the specific resource/action happens downstream, in [`wrap`].
    async fn authenticate(&self, token: Option<&str>) -> McpResult<SecurityContext> {
        let tenant = self.auth_manager.authenticate(token).await.map_err(McpError::from)?;
        Ok(SecurityContext::new(tenant, self.security_config.clone()))
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    tracing::info!("shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::CapabilityRegistry;

    fn test_server() -> McpServer {
        let registry = Arc::new(CapabilityRegistry::new(vec![]));
        let adapter = Arc::new(McpAdapter::new(registry, vec![], vec![], vec![]));
        McpServer::new(
            DokkuMcpConfig::default(),
            adapter,
            Arc::new(TenantAuthManager::noop()),
            Arc::new(AuditLogger::new(false)),
            SecurityConfig::default(),
        )
    }

    #[tokio::test]
    async fn uninitialized_request_is_rejected() {
        let server = test_server();
        let request = JsonRpcRequest::new("tools/list", None, Some(serde_json::Value::from(1)));
        let response = server.handle_request(request, None).await.unwrap().unwrap();
        assert!(response.error.is_some());
    }

    #[tokio::test]
    async fn initialize_marks_server_ready() {
        let server = test_server();
        let params = InitializeParams {
            protocol_version: "2024-11-05".to_string(),
            capabilities: crate::protocol::ClientCapabilities::default(),
            client_info: None,
        };
        let result = server.handle_initialize(params).await.unwrap();
        assert_eq!(result.server_info.name, "dokku-mcp");
        assert!(*server.initialized.read().await);
    }

    #[tokio::test]
    async fn unsupported_protocol_version_is_rejected() {
        let server = test_server();
        let params = InitializeParams {
            protocol_version: "999.0.0".to_string(),
            capabilities: crate::protocol::ClientCapabilities::default(),
            client_info: None,
        };
        assert!(server.handle_initialize(params).await.is_err());
    }

    #[tokio::test]
    async fn notification_produces_no_response() {
        let server = test_server();
        let request = JsonRpcRequest::new("initialized", None, None);
        let response = server.handle_request(request, None).await.unwrap();
        assert!(response.is_none());
        assert!(*server.initialized.read().await);
    }
}
