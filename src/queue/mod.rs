//! Durable task queue.
//!
//! Tasks are JSON payloads addressed to an HTTP path. [`SpoolQueue`] persists
//! them on disk; [`QueueRunner`] delivers them by POSTing to the path,
//! retrying transient failures with exponential backoff.
//!
//! The [`TaskQueue`] trait is the seam the rest of the crate enqueues through,
//! so tests can substitute a recording queue.

pub mod drain;
pub mod retry;
pub mod runner;
pub mod spool;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::types::TaskId;

pub use drain::{cleanup_finished_tasks, drain_pending};
pub use retry::RetryConfig;
pub use runner::{DeliveryOutcome, DrainSummary, QueueRunner, RunnerConfig, classify_status};
pub use spool::{QueuedTask, SpoolQueue, SpooledTask};

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid task id (path traversal attempt?): {0}")]
    InvalidTaskId(TaskId),

    #[error("task already exists: {0}")]
    DuplicateTask(TaskId),

    #[error("task target must be an absolute path, got {0:?}")]
    InvalidTarget(String),

    #[error("spool write panicked: {0}")]
    Join(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, QueueError>;

/// Accepts tasks for later delivery.
#[async_trait]
pub trait TaskQueue: Send + Sync {
    /// Durably enqueues `payload` for delivery to `target` (an absolute path
    /// such as `/_/tasks/deploy`).
    async fn enqueue(&self, target: &str, payload: Value) -> Result<TaskId>;
}
