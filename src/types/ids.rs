//! Newtype wrappers for domain identifiers.
//!
//! These types prevent accidental mixing of strings that mean different things
//! (a branch name where a deploy target is expected, a commit id where a task id
//! is expected) and make signatures self-documenting.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A git commit identifier as reported by the push event's `after` field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommitId(pub String);

impl CommitId {
    /// Creates a new CommitId from a string.
    ///
    /// Note: This does not validate the format. GitHub sends 40 hex characters.
    pub fn new(s: impl Into<String>) -> Self {
        CommitId(s.into())
    }

    /// Returns the commit id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true for the all-zero id GitHub sends when a branch is deleted.
    pub fn is_null(&self) -> bool {
        !self.0.is_empty() && self.0.bytes().all(|b| b == b'0')
    }
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CommitId {
    fn from(s: &str) -> Self {
        CommitId(s.to_string())
    }
}

/// A git branch name, without the `refs/heads/` prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BranchName(pub String);

impl BranchName {
    pub fn new(s: impl Into<String>) -> Self {
        BranchName(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BranchName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for BranchName {
    fn from(s: &str) -> Self {
        BranchName(s.to_string())
    }
}

/// A named deploy destination (e.g. `"prod"`, `"staging"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeployTarget(pub String);

impl DeployTarget {
    /// The target used when a manual deploy names none.
    pub const DEFAULT: &'static str = "default";

    pub fn new(s: impl Into<String>) -> Self {
        DeployTarget(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for DeployTarget {
    fn default() -> Self {
        DeployTarget(Self::DEFAULT.to_string())
    }
}

impl fmt::Display for DeployTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for DeployTarget {
    fn from(s: &str) -> Self {
        DeployTarget(s.to_string())
    }
}

/// Identifies a task in the queue spool.
///
/// Generated ids have the form `<unix-millis>-<uuid>`, so sorting ids
/// lexically yields enqueue order (the millisecond prefix is zero-padded).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub String);

impl TaskId {
    pub fn new(s: impl Into<String>) -> Self {
        TaskId(s.into())
    }

    /// Generates a fresh, time-ordered task id.
    pub fn generate() -> Self {
        let millis = chrono::Utc::now().timestamp_millis().max(0);
        TaskId(format!("{:013}-{}", millis, uuid::Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for TaskId {
    fn from(s: String) -> Self {
        TaskId(s)
    }
}
