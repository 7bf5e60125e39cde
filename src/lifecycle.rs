//! Startup/shutdown ordering for the whole server: build config, wire up
//! the capability runtime, run the initial sync, register capabilities,
//! start the transport, and tear everything down cleanly on signal.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::capability::{PromptProvider, ResourceProvider, ToolProvider};
use crate::config::DokkuMcpConfig;
use crate::deployment::DeploymentRepository;
use crate::error::McpResult;
use crate::modules::apps::AppsModule;
use crate::modules::domains::DomainsModule;
use crate::modules::status::StatusModule;
use crate::onboarding::OnboardingModule;
use crate::registry::CapabilityRegistry;
use crate::security::{AuditLogger, SecurityConfig, TenantAuthManager};
use crate::server::adapter::{AdapterCapabilitySource, McpAdapter};
use crate::server::McpServer;
use crate::ssh::SshExecutor;

/// Owns every long-lived component for the process's lifetime and drives
/// the documented startup/shutdown sequence.
pub struct LifecycleCoordinator {
    config: DokkuMcpConfig,
    registry: Arc<CapabilityRegistry>,
    executor: SshExecutor,
    adapter: Arc<McpAdapter>,
    server: McpServer,
    sync_cancel: CancellationToken,
    sync_handle: Option<tokio::task::JoinHandle<()>>,
}

impl LifecycleCoordinator {
    /// Steps 1-4 of startup: build config, construct every component, run
    /// the initial synchronous registry sync, and register capabilities.
    /// The transport itself is started separately by [`run`](Self::run) so
    /// callers can choose stdio vs. SSE without blocking construction.
    pub async fn bootstrap(config: DokkuMcpConfig) -> McpResult<Self> {
        let executor = SshExecutor::new(&config.dokku);
        let repo = Arc::new(DeploymentRepository::new());

        let apps = Arc::new(AppsModule::new(executor.clone(), repo.clone()));
        let domains = Arc::new(DomainsModule::new(executor.clone()));
        let status = Arc::new(StatusModule::new(executor.clone()));
        let onboarding = Arc::new(OnboardingModule::new());

        let known: Vec<Arc<dyn crate::capability::CapabilityModule>> = vec![
            apps.clone() as _,
            domains.clone() as _,
            status.clone() as _,
            onboarding.clone() as _,
        ];
        let registry = Arc::new(CapabilityRegistry::new(known));

        let startup_cancel = CancellationToken::new();
        registry.sync(&executor, &startup_cancel).await;

        let tool_providers: Vec<Arc<dyn ToolProvider>> =
            vec![apps.clone() as _, domains.clone() as _, status.clone() as _];
        let resource_providers: Vec<Arc<dyn ResourceProvider>> = vec![onboarding.clone() as _];
        let prompt_providers: Vec<Arc<dyn PromptProvider>> = Vec::new();

        let adapter = Arc::new(McpAdapter::new(
            registry.clone(),
            tool_providers,
            resource_providers,
            prompt_providers,
        ));
        onboarding.set_source(Arc::new(AdapterCapabilitySource::new(adapter.clone())));
        adapter.register_all();

        let security_config = SecurityConfig { multi_tenant_enabled: config.multi_tenant.enabled };
        let auth_manager = Arc::new(TenantAuthManager::noop());
        let audit_logger = Arc::new(AuditLogger::new(config.multi_tenant.enabled));

        let server = McpServer::new(config.clone(), adapter.clone(), auth_manager, audit_logger, security_config);

        Ok(Self {
            config,
            registry,
            executor,
            adapter,
            server,
            sync_cancel: CancellationToken::new(),
            sync_handle: None,
        })
    }

    /// The tools the server would currently advertise, for the `tools`
    /// CLI subcommand. Reflects the registry's active set at call time.
    pub async fn list_tools(&self) -> Vec<crate::protocol::Tool> {
        self.adapter.list_tools().await
    }

    /// Step 5-6: spawn the background sync loop (if configured) and start
    /// the configured transport. Blocks until the transport stops.
    pub async fn run(&mut self) -> McpResult<()> {
        if self.config.plugin_discovery.sync_interval.as_secs() > 0 && self.config.plugin_discovery.enabled {
            let handle = self.registry.clone().spawn_sync_loop(
                self.executor.clone(),
                self.config.plugin_discovery.clone(),
                self.sync_cancel.clone(),
            );
            self.sync_handle = Some(handle);
        }

        match self.config.transport.kind {
            crate::config::TransportKind::Stdio => self.server.run_stdio().await,
            crate::config::TransportKind::Sse => self.server.run_sse().await,
        }
    }

    /// Cancels the sync loop; SSE graceful shutdown is handled inside
    /// `McpServer::run_sse` itself (30s deadline). Stdio needs no teardown.
    pub async fn shutdown(&mut self) {
        info!("shutting down");
        self.sync_cancel.cancel();
        if let Some(handle) = self.sync_handle.take() {
            let _ = handle.await;
        }
    }
}
