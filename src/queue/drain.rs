//! Draining pending tasks from the spool and sweeping finished ones.

use std::path::Path;
use std::time::{Duration, SystemTime};

use crate::persistence::fsync_dir;
use crate::types::TaskId;

use super::Result;
use super::spool::{SpooledTask, remove_task};

/// Returns every pending task (payload present, no `.done`/`.dead` marker),
/// sorted by task id.
///
/// Generated ids start with a zero-padded millisecond timestamp, so this is
/// also enqueue order.
///
/// # Errors
///
/// Returns an error if the spool directory cannot be read.
pub fn drain_pending(spool_dir: &Path) -> Result<Vec<SpooledTask>> {
    if !spool_dir.exists() {
        return Ok(Vec::new());
    }

    let mut pending = Vec::new();

    for entry in std::fs::read_dir(spool_dir)? {
        let path = entry?.path();

        if path.extension().is_some_and(|e| e == "json")
            && let Some(task_id) = extract_task_id(&path)
        {
            let task = SpooledTask::new(spool_dir, task_id);
            if task.is_pending() {
                pending.push(task);
            }
        }
    }

    pending.sort_by(|a, b| a.task_id.cmp(&b.task_id));

    Ok(pending)
}

/// Removes finished tasks (done or dead) whose marker is older than `grace_period`.
///
/// Returns the number of tasks removed.
pub fn cleanup_finished_tasks(spool_dir: &Path, grace_period: Duration) -> Result<usize> {
    if !spool_dir.exists() {
        return Ok(0);
    }

    let cutoff = SystemTime::now()
        .checked_sub(grace_period)
        .unwrap_or(SystemTime::UNIX_EPOCH);
    let mut removed = 0;

    for entry in std::fs::read_dir(spool_dir)? {
        let path = entry?.path();

        // <id>.json.done or <id>.json.dead
        if path
            .extension()
            .is_some_and(|e| e == "done" || e == "dead")
            && let Ok(metadata) = path.metadata()
            && let Ok(modified) = metadata.modified()
            && modified < cutoff
            && let Some(json_name) = path.file_stem()
            && let Some(task_id) = extract_task_id(Path::new(json_name))
        {
            remove_task(&SpooledTask::new(spool_dir, task_id))?;
            removed += 1;
        }
    }

    if removed > 0 {
        fsync_dir(spool_dir)?;
    }

    Ok(removed)
}

/// `<spool_dir>/<task-id>.json` -> `<task-id>`
fn extract_task_id(path: &Path) -> Option<TaskId> {
    let stem = path.file_stem()?.to_str()?;
    Some(TaskId::new(stem))
}
