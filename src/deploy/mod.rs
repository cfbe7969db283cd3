//! Deploy pipeline: push → queued [`DeployTask`] → deploy service.
//!
//! [`DeployTrigger`] decides whether a push deploys and enqueues the task;
//! [`DeployWorker`] runs when the queue delivers it and calls the external
//! deploy service through [`DeployServiceClient`].

pub mod client;
pub mod targets;
pub mod task;
pub mod trigger;
pub mod worker;

use thiserror::Error;

use crate::settings::SettingsError;

pub use client::{DEFAULT_DEPLOY_TIMEOUT, DEPLOY_METHOD, DeployServiceClient};
pub use targets::{DeployTargetMap, deploy_target_for, load_deploy_targets, set_deploy_target};
pub use task::{DEPLOY_TASK_PATH, DeployTask, TASK_HOST_GITHUB};
pub use trigger::{DeployTrigger, TriggerError};
pub use worker::DeployWorker;

/// Errors from running a deploy task.
#[derive(Debug, Error)]
pub enum DeployError {
    /// The delivered task did not parse. Retrying will not help.
    #[error("malformed deploy task: {0}")]
    MalformedTask(#[source] serde_json::Error),

    #[error("failed to encode deploy request: {0}")]
    Encode(#[from] serde_json::Error),

    #[error(transparent)]
    Settings(#[from] SettingsError),

    /// The deploy service answered with something other than 200.
    #[error("deploy service responded {status}: {body}")]
    Downstream { status: u16, body: String },

    /// Connection failure or timeout.
    #[error("deploy service unreachable: {0}")]
    Transport(#[from] reqwest::Error),
}
