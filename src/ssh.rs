//! Authenticated remote command execution against a Dokku host over SSH.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::DokkuConfig;
use crate::error::{McpError, McpResult};
use crate::sanitizer::sanitize;

/// Authenticated remote command execution with timeout and output capture.
///
/// Stateless and safe for concurrent use: every call builds a fresh `ssh`
/// invocation from the configured connection parameters.
#[derive(Debug, Clone)]
pub struct SshExecutor {
    host: String,
    port: u16,
    user: String,
    key_path: Option<PathBuf>,
    timeout: Duration,
}

impl SshExecutor {
    pub fn new(config: &DokkuConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            user: config.user.clone(),
            key_path: config.ssh_key_path.as_ref().map(PathBuf::from),
            timeout: config.timeout,
        }
    }

    /// Resolve which identity file argument (if any) to pass to `ssh -i`.
    ///
    /// Priority: an available SSH agent needs no `-i` flag and is preferred;
    /// otherwise `~/.ssh/id_rsa` if readable; otherwise the configured key
    /// path if readable; otherwise fall back to relying on the agent anyway.
    fn resolve_identity(&self) -> Option<PathBuf> {
        if std::env::var_os("SSH_AUTH_SOCK").is_some() {
            return None;
        }
        let default_key = dirs_home().map(|home| home.join(".ssh/id_rsa"));
        if let Some(ref path) = default_key {
            if path.is_file() {
                return Some(path.clone());
            }
        }
        if let Some(ref configured) = self.key_path {
            if configured.is_file() {
                return Some(configured.clone());
            }
        }
        None
    }

    /// Execute `cmd args...` on the remote host, honoring both the outer
    /// cancellation token and this executor's configured timeout (whichever
    /// is shorter wins).
    pub async fn execute_command(
        &self,
        cancel: &CancellationToken,
        cmd: &str,
        args: &[&str],
    ) -> McpResult<String> {
        let mut argv: Vec<String> = vec![
            "-o".to_string(),
            "LogLevel=QUIET".to_string(),
            "-o".to_string(),
            "StrictHostKeyChecking=no".to_string(),
            "-o".to_string(),
            format!("ConnectTimeout={}", self.timeout.as_secs()),
            "-p".to_string(),
            self.port.to_string(),
        ];
        if let Some(identity) = self.resolve_identity() {
            argv.push("-i".to_string());
            argv.push(identity.display().to_string());
        }
        argv.push(format!("{}@{}", self.user, self.host));
        argv.push("--".to_string());
        argv.push(cmd.to_string());
        argv.extend(args.iter().map(|a| a.to_string()));

        debug!(argv = %sanitize(&argv.join(" ")), "executing remote command");

        let mut command = Command::new("ssh");
        command.args(&argv);
        command.stdin(std::process::Stdio::null());
        command.stdout(std::process::Stdio::piped());
        command.stderr(std::process::Stdio::piped());

        let child = command
            .spawn()
            .map_err(|e| McpError::remote_execution(-1, format!("failed to spawn ssh: {e}")))?;

        let run = async {
            tokio::select! {
                result = child.wait_with_output() => result.map_err(|e| {
                    McpError::remote_execution(-1, format!("ssh I/O error: {e}"))
                }),
                _ = cancel.cancelled() => Err(McpError::Cancelled {
                    reason: "ssh command cancelled".to_string(),
                }),
            }
        };

        let output = match tokio::time::timeout(self.timeout, run).await {
            Ok(result) => result?,
            Err(_) => {
                warn!(cmd, "ssh command timed out");
                return Err(McpError::remote_execution(
                    -1,
                    format!("command timed out after {:?}", self.timeout),
                ));
            }
        };

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        if !output.status.success() {
            let exit_code = output.status.code().unwrap_or(-1);
            let stderr_tail: String = String::from_utf8_lossy(&output.stderr)
                .lines()
                .rev()
                .take(5)
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect::<Vec<_>>()
                .join("\n");
            return Err(McpError::remote_execution(exit_code, sanitize(&stderr_tail)));
        }

        Ok(sanitize(&combined))
    }
}

fn dirs_home() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from).filter(|p: &PathBuf| p.as_path() != Path::new(""))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn executor() -> SshExecutor {
        SshExecutor::new(&DokkuConfig {
            host: "localhost".to_string(),
            port: 22,
            user: "dokku".to_string(),
            path: "dokku".to_string(),
            ssh_key_path: None,
            timeout: Duration::from_secs(5),
        })
    }

    #[tokio::test]
    async fn unreachable_host_returns_remote_execution_error() {
        let exec = SshExecutor::new(&DokkuConfig {
            host: "127.0.0.1".to_string(),
            port: 1,
            user: "dokku".to_string(),
            path: "dokku".to_string(),
            ssh_key_path: None,
            timeout: Duration::from_millis(500),
        });
        let cancel = CancellationToken::new();
        let result = exec.execute_command(&cancel, "apps:list", &[]).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn cancellation_aborts_in_flight_command() {
        let exec = executor();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = exec.execute_command(&cancel, "apps:list", &[]).await;
        assert!(result.is_err());
    }
}
