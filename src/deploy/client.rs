//! Outbound client for the external deploy RPC service.

use std::time::Duration;

use reqwest::StatusCode;
use tracing::debug;

use super::DeployError;
use super::task::DeployTask;
use crate::rpc::RpcRequest;

/// Method invoked on the deploy service.
pub const DEPLOY_METHOD: &str = "GrowDeployService.Deploy";

/// Default timeout for the deploy call.
pub const DEFAULT_DEPLOY_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct DeployServiceClient {
    http: reqwest::Client,
}

impl DeployServiceClient {
    pub fn new(timeout: Duration) -> Result<Self, DeployError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(DeployServiceClient { http })
    }

    /// POSTs `{"method": "GrowDeployService.Deploy", "params": [task]}` to
    /// `<host>/_/rpc`. Returns the response body on HTTP 200.
    ///
    /// # Errors
    ///
    /// `DeployError::Downstream` for any other status, `DeployError::Transport`
    /// for connection failures and timeouts.
    pub async fn deploy(&self, host: &str, task: &DeployTask) -> Result<String, DeployError> {
        let url = format!("{}/_/rpc", host.trim_end_matches('/'));
        let request = RpcRequest::new(DEPLOY_METHOD, task)?;

        debug!(%url, commit_id = %task.commit_id, "Calling deploy service");
        let response = self.http.post(&url).json(&request).send().await?;

        let status = response.status();
        let body = response.text().await?;

        if status == StatusCode::OK {
            Ok(body)
        } else {
            Err(DeployError::Downstream {
                status: status.as_u16(),
                body,
            })
        }
    }
}
