//! Handles deploy tasks delivered by the queue.

use std::sync::Arc;

use tracing::{error, info, instrument};

use super::DeployError;
use super::client::DeployServiceClient;
use super::task::DeployTask;
use crate::settings::keys::DEPLOY_SERVICE_HOST;
use crate::settings::{SettingsStore, require_string};

/// Forwards deploy tasks to the deploy service.
///
/// Holds no per-task state: a redelivered task is simply forwarded again.
#[derive(Clone)]
pub struct DeployWorker {
    settings: Arc<dyn SettingsStore>,
    client: DeployServiceClient,
}

impl DeployWorker {
    pub fn new(settings: Arc<dyn SettingsStore>, client: DeployServiceClient) -> Self {
        DeployWorker { settings, client }
    }

    /// Runs one deploy. The outcome is logged here; the error is returned so
    /// the caller can signal the queue to retry.
    #[instrument(skip_all, fields(commit_id = %task.commit_id, deploy_target = %task.deploy_target))]
    pub async fn handle(&self, task: &DeployTask) -> Result<(), DeployError> {
        // Read per task so a host configured after enqueue still applies.
        let host = require_string(self.settings.as_ref(), DEPLOY_SERVICE_HOST)?;

        match self.client.deploy(&host, task).await {
            Ok(_) => {
                info!(commit_id = %task.commit_id, "Deployed");
                Ok(())
            }
            Err(DeployError::Downstream { status, body }) => {
                error!(commit_id = %task.commit_id, status, %body, "Deploy failed");
                Err(DeployError::Downstream { status, body })
            }
            Err(e) => {
                error!(commit_id = %task.commit_id, error = %e, "Deploy failed");
                Err(e)
            }
        }
    }
}

impl std::fmt::Debug for DeployWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeployWorker")
            .field("client", &self.client)
            .finish_non_exhaustive()
    }
}
