//! Durable file writes.
//!
//! Both the settings store and the task spool need the same guarantee: a reader
//! sees either the previous contents of a file or the new contents, never a
//! partial write, and a completed write survives power loss.
//!
//! On POSIX systems, creating or renaming a file updates the directory entry.
//! Without fsync on the directory, the entry may not survive a power loss even
//! if the file contents were synced, so every rename is followed by a
//! directory fsync.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

/// Syncs a file's contents and metadata to disk.
pub fn fsync_file(file: &File) -> io::Result<()> {
    file.sync_all()
}

/// Syncs a directory so that entries created, renamed or removed in it are durable.
///
/// # Errors
///
/// Returns an error if the path doesn't exist or if the fsync system call fails.
pub fn fsync_dir(dir_path: &Path) -> io::Result<()> {
    let dir = OpenOptions::new().read(true).open(dir_path)?;
    dir.sync_all()
}

/// Writes `bytes` to `path` atomically.
///
/// 1. Write to `tmp_path`
/// 2. fsync the temp file
/// 3. Rename onto `path`
/// 4. fsync the parent directory
///
/// The parent directory is created if it does not exist. `tmp_path` must live
/// in the same directory as `path` for the rename to be atomic.
pub fn write_atomic(path: &Path, tmp_path: &Path, bytes: &[u8]) -> io::Result<()> {
    let parent = path.parent().filter(|p| !p.as_os_str().is_empty());
    if let Some(parent) = parent {
        std::fs::create_dir_all(parent)?;
    }

    {
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(tmp_path)?;
        file.write_all(bytes)?;
        fsync_file(&file)?;
    }

    std::fs::rename(tmp_path, path)?;

    if let Some(parent) = parent {
        fsync_dir(parent)?;
    }

    Ok(())
}

/// Creates an empty marker file and makes its directory entry durable.
///
/// Idempotent: an existing marker is left alone. The marker being empty means
/// any partial state is equivalent to complete.
pub fn touch_durable(path: &Path) -> io::Result<()> {
    if path.exists() {
        return Ok(());
    }

    drop(
        OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?,
    );

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fsync_dir(parent)?;
    }

    Ok(())
}
