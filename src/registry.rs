//! Tracks which capability modules are currently active, based on periodic
//! comparison against the set of enabled Dokku plugins.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::capability::CapabilityModule;
use crate::config::PluginDiscoveryConfig;
use crate::discovery::get_enabled_plugins;
use crate::ssh::SshExecutor;

/// A module always-active (no Dokku plugin dependency) or gated by whether
/// its `dokku_plugin_name()` currently shows up in `plugin:list` as enabled.
pub struct CapabilityRegistry {
    known: Vec<Arc<dyn CapabilityModule>>,
    active: RwLock<HashMap<String, bool>>,
}

impl CapabilityRegistry {
    pub fn new(known: Vec<Arc<dyn CapabilityModule>>) -> Self {
        let active = known.iter().map(|m| (m.id().to_string(), false)).collect();
        Self {
            known,
            active: RwLock::new(active),
        }
    }

    pub fn known_modules(&self) -> &[Arc<dyn CapabilityModule>] {
        &self.known
    }

    /// Compare every module's Dokku-plugin dependency against the currently
    /// enabled set, flip its active flag on change, and log the transition.
    /// A module with no `dokku_plugin_name()` is vacuously "enabled" and so
    /// is always active; it still goes through this same comparison.
    pub async fn sync(&self, executor: &SshExecutor, cancel: &CancellationToken) {
        let enabled = get_enabled_plugins(executor, cancel).await;

        let mut active = self.active.write().await;
        for module in &self.known {
            let should_be_active = match module.dokku_plugin_name() {
                None => true,
                Some(plugin_name) => enabled.iter().any(|name| name == plugin_name),
            };
            let was_active = active.get(module.id()).copied().unwrap_or(false);
            if should_be_active != was_active {
                active.insert(module.id().to_string(), should_be_active);
                if should_be_active {
                    info!(module = module.id(), "capability module activated");
                } else {
                    info!(module = module.id(), "capability module deactivated");
                }
            }
        }
    }

    pub async fn is_active(&self, module_id: &str) -> bool {
        self.active.read().await.get(module_id).copied().unwrap_or(false)
    }

    pub async fn get_active_modules(&self) -> Vec<Arc<dyn CapabilityModule>> {
        let active = self.active.read().await;
        self.known
            .iter()
            .filter(|m| active.get(m.id()).copied().unwrap_or(false))
            .cloned()
            .collect()
    }

    /// Spawns the background sync loop at the configured interval. Returns
    /// the task handle so the lifecycle coordinator can abort it on shutdown.
    pub fn spawn_sync_loop(
        self: Arc<Self>,
        executor: SshExecutor,
        config: PluginDiscoveryConfig,
        cancel: CancellationToken,
    ) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            if !config.enabled {
                return;
            }
            let mut ticker = tokio::time::interval(config.sync_interval);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        self.sync(&executor, &cancel).await;
                    }
                    _ = cancel.cancelled() => break,
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct AlwaysOn;
    impl CapabilityModule for AlwaysOn {
        fn id(&self) -> &str {
            "core"
        }
        fn name(&self) -> &str {
            "core"
        }
        fn description(&self) -> &str {
            "always active"
        }
        fn version(&self) -> &str {
            "1.0"
        }
    }

    struct PluginGated;
    impl CapabilityModule for PluginGated {
        fn id(&self) -> &str {
            "postgres"
        }
        fn name(&self) -> &str {
            "postgres"
        }
        fn description(&self) -> &str {
            "postgres plugin"
        }
        fn version(&self) -> &str {
            "1.0"
        }
        fn dokku_plugin_name(&self) -> Option<&str> {
            Some("postgres")
        }
    }

    #[tokio::test]
    async fn all_modules_start_inactive_before_first_sync() {
        let registry = CapabilityRegistry::new(vec![Arc::new(AlwaysOn), Arc::new(PluginGated)]);
        assert!(!registry.is_active("core").await);
        assert!(!registry.is_active("postgres").await);
    }

    #[tokio::test]
    async fn sync_activates_module_without_plugin_dependency() {
        let registry = CapabilityRegistry::new(vec![Arc::new(AlwaysOn)]);
        let executor = SshExecutor::new(&crate::config::DokkuConfig {
            host: "127.0.0.1".to_string(),
            port: 1,
            user: "dokku".to_string(),
            path: "dokku".to_string(),
            ssh_key_path: None,
            timeout: std::time::Duration::from_millis(200),
        });
        let cancel = CancellationToken::new();
        registry.sync(&executor, &cancel).await;
        assert!(registry.is_active("core").await);
    }

    #[tokio::test]
    async fn plugin_gated_module_stays_inactive_without_enabled_plugin() {
        let registry = CapabilityRegistry::new(vec![Arc::new(PluginGated)]);
        let executor = SshExecutor::new(&crate::config::DokkuConfig {
            host: "127.0.0.1".to_string(),
            port: 1,
            user: "dokku".to_string(),
            path: "dokku".to_string(),
            ssh_key_path: None,
            timeout: std::time::Duration::from_millis(200),
        });
        let cancel = CancellationToken::new();
        registry.sync(&executor, &cancel).await;
        assert!(!registry.is_active("postgres").await);
    }
}
