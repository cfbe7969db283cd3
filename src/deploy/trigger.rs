//! Turns pushes (and explicit deploy requests) into queued deploy tasks.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use super::targets::deploy_target_for;
use super::task::{DEPLOY_TASK_PATH, DeployTask};
use crate::queue::{QueueError, TaskQueue};
use crate::settings::keys::{GITHUB_ACCESS_TOKEN, GITHUB_REPO};
use crate::settings::{SettingsError, SettingsStore, require_string};
use crate::types::{CommitId, DeployTarget, TaskId};
use crate::webhooks::PushEvent;

#[derive(Debug, Error)]
pub enum TriggerError {
    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error("failed to queue deploy: {0}")]
    Queue(#[from] QueueError),

    #[error("failed to encode deploy task: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Clone)]
pub struct DeployTrigger {
    settings: Arc<dyn SettingsStore>,
    queue: Arc<dyn TaskQueue>,
}

impl DeployTrigger {
    pub fn new(settings: Arc<dyn SettingsStore>, queue: Arc<dyn TaskQueue>) -> Self {
        DeployTrigger { settings, queue }
    }

    /// Queues a deploy if the pushed branch has a configured target.
    ///
    /// Returns the queued task's id, or `None` when the push is not
    /// deployable: a tag, a deleted branch, or a branch with no mapping.
    pub async fn on_push(&self, event: &PushEvent) -> Result<Option<TaskId>, TriggerError> {
        let Some(branch) = event.branch() else {
            debug!(git_ref = %event.git_ref, "Push is not to a branch, ignoring");
            return Ok(None);
        };

        if event.deleted || event.after.is_null() {
            debug!(%branch, "Branch deleted, ignoring");
            return Ok(None);
        }

        let Some(target) = deploy_target_for(self.settings.as_ref(), &branch)? else {
            debug!(%branch, "No deploy target for branch");
            return Ok(None);
        };

        info!(%branch, deploy_target = %target, commit_id = %event.after, "Push matches deploy target");
        self.deploy(event.after.clone(), target).await.map(Some)
    }

    /// Queues a deploy of `commit_id` to `deploy_target`.
    ///
    /// Repo and access token are read now and baked into the task.
    pub async fn deploy(
        &self,
        commit_id: CommitId,
        deploy_target: DeployTarget,
    ) -> Result<TaskId, TriggerError> {
        let repo = require_string(self.settings.as_ref(), GITHUB_REPO)?;
        let token = require_string(self.settings.as_ref(), GITHUB_ACCESS_TOKEN)?;

        let task = DeployTask::github(repo, token, commit_id, deploy_target);
        let payload = serde_json::to_value(&task)?;
        let task_id = self.queue.enqueue(DEPLOY_TASK_PATH, payload).await?;

        info!(
            commit_id = %task.commit_id,
            deploy_target = %task.deploy_target,
            %task_id,
            "Queued for deploy"
        );
        Ok(task_id)
    }
}

impl std::fmt::Debug for DeployTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeployTrigger").finish_non_exhaustive()
    }
}
