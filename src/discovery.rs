//! Queries the Dokku host for currently-enabled plugins.

use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::parser::parse_plugin_list;
use crate::ssh::SshExecutor;

const SUB_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(15);

/// Returns the names of plugins Dokku reports as `enabled`.
///
/// Any transport error (connection failure, timeout, non-zero exit) is
/// treated as "no plugins discovered this cycle" rather than propagated —
/// the registry sync simply retries on its next interval.
pub async fn get_enabled_plugins(executor: &SshExecutor, cancel: &CancellationToken) -> Vec<String> {
    let cancel = cancel.child_token();
    let sub_cancel = cancel.clone();
    let guard = tokio::spawn(async move {
        tokio::time::sleep(SUB_TIMEOUT).await;
        sub_cancel.cancel();
    });

    let result = executor.execute_command(&cancel, "plugin:list", &[]).await;
    guard.abort();

    match result {
        Ok(output) => parse_plugin_list(&output)
            .into_iter()
            .filter(|(_, status)| status == "enabled")
            .map(|(name, _)| name)
            .collect(),
        Err(err) => {
            warn!(error = %err, "plugin:list failed, treating as no enabled plugins this cycle");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DokkuConfig;

    #[tokio::test]
    async fn unreachable_host_yields_empty_list() {
        let executor = SshExecutor::new(&DokkuConfig {
            host: "127.0.0.1".to_string(),
            port: 1,
            user: "dokku".to_string(),
            path: "dokku".to_string(),
            ssh_key_path: None,
            timeout: std::time::Duration::from_millis(500),
        });
        let cancel = CancellationToken::new();
        let plugins = get_enabled_plugins(&executor, &cancel).await;
        assert!(plugins.is_empty());
    }
}
