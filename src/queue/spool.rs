//! Spooled task management with atomic file operations.
//!
//! Each task progresses through states using marker files:
//!
//! ```text
//! <task-id>.json       - pending (contains the QueuedTask envelope)
//! <task-id>.json.done  - delivered (empty marker: the target acknowledged it)
//! <task-id>.json.dead  - abandoned (empty marker: rejected or out of attempts)
//! ```
//!
//! Payload files are written atomically, so a crash mid-enqueue leaves at most
//! an orphaned `.json.tmp` that is never picked up as pending.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::Notify;
use tracing::{debug, info};

use super::{QueueError, Result, TaskQueue};
use crate::persistence::{touch_durable, write_atomic};
use crate::types::TaskId;

/// The envelope persisted for every queued task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedTask {
    /// Path (relative to the runner's base URL) the payload is POSTed to.
    pub target: String,

    /// JSON body delivered to the target.
    pub payload: Value,

    /// When the task was accepted by the queue.
    pub enqueued_at: DateTime<Utc>,
}

impl QueuedTask {
    pub fn new(target: impl Into<String>, payload: Value) -> Self {
        QueuedTask {
            target: target.into(),
            payload,
            enqueued_at: Utc::now(),
        }
    }
}

/// Validates that a task id is safe to use in filenames.
///
/// Rejects empty ids, path separators, null bytes, and a leading dot.
fn validate_task_id(task_id: &TaskId) -> Result<()> {
    let id = task_id.as_str();

    if id.is_empty()
        || id.contains('/')
        || id.contains('\\')
        || id.contains('\0')
        || id.starts_with('.')
    {
        return Err(QueueError::InvalidTaskId(task_id.clone()));
    }

    Ok(())
}

/// A task in the spool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpooledTask {
    pub task_id: TaskId,

    /// Path to the payload file (`<task-id>.json`).
    pub payload_path: PathBuf,

    pub spool_dir: PathBuf,
}

impl SpooledTask {
    pub fn new(spool_dir: &Path, task_id: TaskId) -> Self {
        let payload_path = spool_dir.join(format!("{}.json", task_id.as_str()));
        SpooledTask {
            task_id,
            payload_path,
            spool_dir: spool_dir.to_path_buf(),
        }
    }

    pub fn done_marker_path(&self) -> PathBuf {
        self.payload_path.with_extension("json.done")
    }

    pub fn dead_marker_path(&self) -> PathBuf {
        self.payload_path.with_extension("json.dead")
    }

    pub fn temp_path(&self) -> PathBuf {
        self.payload_path.with_extension("json.tmp")
    }

    /// Pending: payload exists and neither marker does.
    pub fn is_pending(&self) -> bool {
        self.payload_path.exists() && !self.is_done() && !self.is_dead()
    }

    pub fn is_done(&self) -> bool {
        self.done_marker_path().exists()
    }

    pub fn is_dead(&self) -> bool {
        self.dead_marker_path().exists()
    }

    /// Reads and deserializes the task envelope.
    pub fn read(&self) -> Result<QueuedTask> {
        let bytes = std::fs::read(&self.payload_path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Writes a task to the spool atomically.
///
/// # Errors
///
/// Returns `QueueError::DuplicateTask` if a task with the same id already exists
/// (pending or finished), `QueueError::InvalidTaskId` for unsafe ids, and
/// `QueueError::Io` for filesystem errors.
pub fn spool_task(spool_dir: &Path, task_id: &TaskId, task: &QueuedTask) -> Result<SpooledTask> {
    validate_task_id(task_id)?;
    std::fs::create_dir_all(spool_dir)?;

    let spooled = SpooledTask::new(spool_dir, task_id.clone());
    if spooled.payload_path.exists() || spooled.is_done() || spooled.is_dead() {
        return Err(QueueError::DuplicateTask(task_id.clone()));
    }

    let bytes = serde_json::to_vec(task)?;
    write_atomic(&spooled.payload_path, &spooled.temp_path(), &bytes)?;

    Ok(spooled)
}

/// Marks a task as delivered. Idempotent.
pub fn mark_done(task: &SpooledTask) -> Result<()> {
    Ok(touch_durable(&task.done_marker_path())?)
}

/// Marks a task as abandoned. Idempotent.
pub fn mark_dead(task: &SpooledTask) -> Result<()> {
    Ok(touch_durable(&task.dead_marker_path())?)
}

/// Removes a task and all its marker files. Missing files are ignored.
pub fn remove_task(task: &SpooledTask) -> Result<()> {
    let _ = std::fs::remove_file(task.done_marker_path());
    let _ = std::fs::remove_file(task.dead_marker_path());
    let _ = std::fs::remove_file(&task.payload_path);
    let _ = std::fs::remove_file(task.temp_path());
    Ok(())
}

/// A [`TaskQueue`] backed by a spool directory on local disk.
///
/// Enqueue makes the task durable and wakes whoever holds [`SpoolQueue::notifier`]
/// (normally a [`QueueRunner`](super::QueueRunner)).
#[derive(Debug, Clone)]
pub struct SpoolQueue {
    dir: PathBuf,
    notify: Arc<Notify>,
}

impl SpoolQueue {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        SpoolQueue {
            dir: dir.into(),
            notify: Arc::new(Notify::new()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the handle signalled after every successful enqueue.
    pub fn notifier(&self) -> Arc<Notify> {
        Arc::clone(&self.notify)
    }
}

#[async_trait]
impl TaskQueue for SpoolQueue {
    async fn enqueue(&self, target: &str, payload: Value) -> Result<TaskId> {
        if !target.starts_with('/') {
            return Err(QueueError::InvalidTarget(target.to_string()));
        }

        let task_id = TaskId::generate();
        let task = QueuedTask::new(target, payload);

        // fsyncs stay off the async worker threads.
        let dir = self.dir.clone();
        let id = task_id.clone();
        tokio::task::spawn_blocking(move || spool_task(&dir, &id, &task)).await??;

        debug!(task_id = %task_id, target, "Task spooled");
        info!(task_id = %task_id, "Task queued");
        self.notify.notify_one();

        Ok(task_id)
    }
}
