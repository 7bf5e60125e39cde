//! In-memory deployment history: records, the repository that owns them,
//! and the orchestration operations (`deploy`, `rollback`, `cancel`).

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{McpError, McpResult};
use crate::modules::{validate_app_name, validate_git_ref};
use crate::ssh::SshExecutor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
    RolledBack,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deployment {
    pub id: Uuid,
    pub app_name: String,
    pub git_ref: String,
    pub status: DeploymentStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error_msg: Option<String>,
    pub is_rollback: bool,
}

/// Owns the id→record map and the `app_name → ordered ids` secondary index
/// (most-recent first) behind a single mutex.
#[derive(Default)]
pub struct DeploymentRepository {
    inner: Mutex<RepoState>,
}

#[derive(Default)]
struct RepoState {
    records: HashMap<Uuid, Deployment>,
    by_app: HashMap<String, Vec<Uuid>>,
}

impl DeploymentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upserts the record and, on first insert, prepends its id to the
    /// app's secondary index (most-recent first).
    pub fn save(&self, deployment: Deployment) {
        let mut state = self.inner.lock().expect("deployment repository lock poisoned");
        let is_new = !state.records.contains_key(&deployment.id);
        let app_name = deployment.app_name.clone();
        let id = deployment.id;
        state.records.insert(id, deployment);
        if is_new {
            state.by_app.entry(app_name).or_default().insert(0, id);
        }
    }

    pub fn get(&self, id: Uuid) -> Option<Deployment> {
        self.inner.lock().expect("deployment repository lock poisoned").records.get(&id).cloned()
    }

    pub fn history_for(&self, app_name: &str) -> Vec<Deployment> {
        let state = self.inner.lock().expect("deployment repository lock poisoned");
        state
            .by_app
            .get(app_name)
            .into_iter()
            .flatten()
            .filter_map(|id| state.records.get(id).cloned())
            .collect()
    }
}

/// Runs the deploy orchestration against the SSH executor, persisting
/// every state transition as it happens.
pub async fn deploy(
    repo: &DeploymentRepository,
    executor: &SshExecutor,
    cancel: &tokio_util::sync::CancellationToken,
    app_name: &str,
    git_ref: &str,
    buildpack: Option<&str>,
) -> McpResult<Deployment> {
    validate_app_name(app_name)?;
    validate_git_ref(git_ref)?;

    let mut record = Deployment {
        id: Uuid::new_v4(),
        app_name: app_name.to_string(),
        git_ref: git_ref.to_string(),
        status: DeploymentStatus::Pending,
        created_at: Utc::now(),
        completed_at: None,
        error_msg: None,
        is_rollback: false,
    };
    repo.save(record.clone());
    record.status = DeploymentStatus::Running;
    repo.save(record.clone());

    let exists = executor
        .execute_command(cancel, "apps:exists", &[app_name])
        .await
        .is_ok();
    if !exists {
        if let Err(err) = executor.execute_command(cancel, "apps:create", &[app_name]).await {
            return fail(repo, record, err.to_string());
        }
    }

    if let Some(buildpack) = buildpack {
        if let Err(err) = executor
            .execute_command(cancel, "config:set", &[app_name, &format!("BUILDPACK_URL={buildpack}")])
            .await
        {
            tracing::warn!(app_name, error = %err, "buildpack set failed, continuing best-effort");
        }
    }

    if let Err(err) = executor.execute_command(cancel, "apps:report", &[app_name]).await {
        return fail(repo, record, err.to_string());
    }

    record.status = DeploymentStatus::Succeeded;
    record.completed_at = Some(Utc::now());
    repo.save(record.clone());
    Ok(record)
}

fn fail(repo: &DeploymentRepository, mut record: Deployment, error_msg: String) -> McpResult<Deployment> {
    record.status = DeploymentStatus::Failed;
    record.completed_at = Some(Utc::now());
    record.error_msg = Some(error_msg.clone());
    repo.save(record.clone());
    Err(McpError::remote_execution(-1, error_msg))
}

/// Creates a new deployment referencing the same `git_ref` as a prior
/// successful one, flagged as a rollback.
pub async fn rollback(
    repo: &DeploymentRepository,
    executor: &SshExecutor,
    cancel: &tokio_util::sync::CancellationToken,
    deployment_id: Uuid,
) -> McpResult<Deployment> {
    let previous = repo
        .get(deployment_id)
        .ok_or_else(|| McpError::ResourceNotFound {
            resource_type: "deployment".to_string(),
            resource_id: deployment_id.to_string(),
        })?;
    if previous.status != DeploymentStatus::Succeeded {
        return Err(McpError::validation(
            "deployment_id",
            "rollback source must be a terminal success",
        ));
    }

    let mut record = Deployment {
        id: Uuid::new_v4(),
        app_name: previous.app_name.clone(),
        git_ref: previous.git_ref.clone(),
        status: DeploymentStatus::Running,
        created_at: Utc::now(),
        completed_at: None,
        error_msg: None,
        is_rollback: true,
    };
    repo.save(record.clone());

    if let Err(err) = executor
        .execute_command(cancel, "apps:report", &[&previous.app_name])
        .await
    {
        return fail(repo, record, err.to_string());
    }

    record.status = DeploymentStatus::RolledBack;
    record.completed_at = Some(Utc::now());
    repo.save(record.clone());
    Ok(record)
}

/// Cancels a deployment still in `running`.
pub fn cancel(repo: &DeploymentRepository, deployment_id: Uuid) -> McpResult<Deployment> {
    let mut record = repo.get(deployment_id).ok_or_else(|| McpError::ResourceNotFound {
        resource_type: "deployment".to_string(),
        resource_id: deployment_id.to_string(),
    })?;
    if record.status != DeploymentStatus::Running {
        return Err(McpError::validation("deployment_id", "deployment is not running"));
    }
    record.status = DeploymentStatus::Failed;
    record.completed_at = Some(Utc::now());
    record.error_msg = Some("user canceled".to_string());
    repo.save(record.clone());
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secondary_index_stays_consistent_with_records() {
        let repo = DeploymentRepository::new();
        let record = Deployment {
            id: Uuid::new_v4(),
            app_name: "foo".to_string(),
            git_ref: "main".to_string(),
            status: DeploymentStatus::Succeeded,
            created_at: Utc::now(),
            completed_at: None,
            error_msg: None,
            is_rollback: false,
        };
        repo.save(record.clone());
        let history = repo.history_for("foo");
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].id, record.id);
    }

    #[test]
    fn cancel_requires_running_state() {
        let repo = DeploymentRepository::new();
        let record = Deployment {
            id: Uuid::new_v4(),
            app_name: "foo".to_string(),
            git_ref: "main".to_string(),
            status: DeploymentStatus::Succeeded,
            created_at: Utc::now(),
            completed_at: None,
            error_msg: None,
            is_rollback: false,
        };
        repo.save(record.clone());
        assert!(cancel(&repo, record.id).is_err());
    }
}
