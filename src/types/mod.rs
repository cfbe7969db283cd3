//! Core domain types for the deploy relay.
//!
//! Identifiers are newtypes so that branch names, deploy targets, commit ids
//! and queue task ids cannot be swapped by accident.

pub mod ids;

pub use ids::{BranchName, CommitId, DeployTarget, TaskId};
