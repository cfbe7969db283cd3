//! Crash-safe filesystem primitives shared by the settings store and the task spool.
//!
//! All writes go through write-to-temp-then-rename with file and directory
//! fsyncs; marker files are empty so their creation is trivially atomic.

pub mod fsync;

pub use fsync::{fsync_dir, fsync_file, touch_durable, write_atomic};
