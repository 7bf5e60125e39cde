//! Core capability modules: thin glue over the SSH executor and output
//! parser exposing application lifecycle, domains, and status as MCP tools.

pub mod apps;
pub mod domains;
pub mod status;

use std::collections::HashSet;

use once_cell::sync::Lazy;

use crate::error::{McpError, McpResult};

/// Reserved app names that collide with Dokku's own command namespaces.
static RESERVED_NAMES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "dokku", "tls", "apps", "plugins", "config", "logs", "ps", "run", "shell", "enter",
        "backup", "restore", "certs", "domains", "git", "storage", "network", "proxy", "service",
        "services", "builder", "scheduler", "registry", "app", "plugin",
    ]
    .into_iter()
    .collect()
});

/// DNS-form app name: `[a-z0-9]([a-z0-9-]{0,61}[a-z0-9])?`, 1-63 chars,
/// not a reserved word.
pub fn validate_app_name(name: &str) -> McpResult<()> {
    if name.is_empty() {
        return Err(McpError::validation("app_name", "must not be empty"));
    }
    if name.len() > 63 {
        return Err(McpError::validation("app_name", "must be at most 63 characters"));
    }
    let bytes = name.as_bytes();
    let is_alnum_lower = |b: u8| b.is_ascii_lowercase() || b.is_ascii_digit();
    if !is_alnum_lower(bytes[0]) {
        return Err(McpError::validation("app_name", "must start with a lowercase letter or digit"));
    }
    if !is_alnum_lower(bytes[bytes.len() - 1]) {
        return Err(McpError::validation("app_name", "must end with a lowercase letter or digit"));
    }
    if !bytes.iter().all(|&b| is_alnum_lower(b) || b == b'-') {
        return Err(McpError::validation(
            "app_name",
            "must contain only lowercase letters, digits, and hyphens",
        ));
    }
    if RESERVED_NAMES.contains(name) {
        return Err(McpError::validation("app_name", format!("'{name}' is a reserved name")));
    }
    Ok(())
}

/// A git ref is validated loosely: non-empty, no whitespace, no leading `-`
/// (which could otherwise be mistaken for a flag).
pub fn validate_git_ref(git_ref: &str) -> McpResult<()> {
    if git_ref.is_empty() {
        return Err(McpError::validation("git_ref", "must not be empty"));
    }
    if git_ref.starts_with('-') {
        return Err(McpError::validation("git_ref", "must not start with '-'"));
    }
    if git_ref.chars().any(|c| c.is_whitespace()) {
        return Err(McpError::validation("git_ref", "must not contain whitespace"));
    }
    Ok(())
}

/// Reject any command name outside a module's closed whitelist before it
/// reaches the SSH layer.
pub fn check_whitelist(module: &str, allowed: &[&str], command: &str) -> McpResult<()> {
    if allowed.contains(&command) {
        Ok(())
    } else {
        Err(McpError::invalid_command(module, command))
    }
}

/// The four observable application states, derived from remote truth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppState {
    Exists,
    Running,
    Stopped,
    Error,
}

impl AppState {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppState::Exists => "exists",
            AppState::Running => "running",
            AppState::Stopped => "stopped",
            AppState::Error => "error",
        }
    }
}

/// Derive the four-state model from `apps:report`/`ps:report` key/value
/// fields. If any process has a non-zero scale the app is `running`; if
/// scale entries exist and are all zero it's `stopped`; if the report
/// carries an explicit error status it's `error`; otherwise `exists`.
pub fn derive_state(fields: &std::collections::HashMap<String, String>) -> AppState {
    if let Some(status) = fields.get("status") {
        if status.eq_ignore_ascii_case("error") || status.eq_ignore_ascii_case("crashed") {
            return AppState::Error;
        }
    }
    if let Some(scale) = fields.get("ps.scale").or_else(|| fields.get("ps scale")) {
        let counts: Vec<u32> = scale
            .split_whitespace()
            .filter_map(|entry| entry.split(':').nth(1))
            .filter_map(|n| n.parse::<u32>().ok())
            .collect();
        if !counts.is_empty() {
            return if counts.iter().any(|&n| n > 0) {
                AppState::Running
            } else {
                AppState::Stopped
            };
        }
    }
    AppState::Exists
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn app_name_boundary_rules() {
        assert!(validate_app_name("my-app").is_ok());
        assert!(validate_app_name("").is_err());
        assert!(validate_app_name("-leading").is_err());
        assert!(validate_app_name("trailing-").is_err());
        assert!(validate_app_name("dokku").is_err());
        assert!(validate_app_name(&"a".repeat(64)).is_err());
    }

    #[test]
    fn whitelist_rejects_unknown_command() {
        let result = check_whitelist("apps", &["apps:list", "apps:create"], "apps:destroy");
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().code(), "INVALID_COMMAND");
    }

    #[test]
    fn derive_state_from_ps_scale() {
        let mut running = HashMap::new();
        running.insert("ps.scale".to_string(), "web:2 worker:0".to_string());
        assert_eq!(derive_state(&running), AppState::Running);

        let mut stopped = HashMap::new();
        stopped.insert("ps.scale".to_string(), "web:0".to_string());
        assert_eq!(derive_state(&stopped), AppState::Stopped);

        let exists = HashMap::new();
        assert_eq!(derive_state(&exists), AppState::Exists);
    }
}
