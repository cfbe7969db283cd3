//! The deploy job carried through the task queue.

use serde::{Deserialize, Serialize};

use crate::types::{CommitId, DeployTarget};

/// Queue path deploy tasks are delivered to.
pub const DEPLOY_TASK_PATH: &str = "/_/tasks/deploy";

/// Source host identifier understood by the deploy service.
pub const TASK_HOST_GITHUB: &str = "github";

/// A self-contained deploy job.
///
/// Carries everything the deploy service needs, so the worker forwards it
/// verbatim without re-reading repo or token settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployTask {
    pub host: String,
    pub repo: String,
    pub commit_id: CommitId,
    pub github_access_token: String,
    pub deploy_target: DeployTarget,
}

impl DeployTask {
    pub fn github(
        repo: impl Into<String>,
        github_access_token: impl Into<String>,
        commit_id: CommitId,
        deploy_target: DeployTarget,
    ) -> Self {
        DeployTask {
            host: TASK_HOST_GITHUB.to_string(),
            repo: repo.into(),
            commit_id,
            github_access_token: github_access_token.into(),
            deploy_target,
        }
    }
}
