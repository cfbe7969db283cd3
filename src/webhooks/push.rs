//! The subset of a GitHub `push` event payload the relay consumes.

use serde::Deserialize;

use crate::types::{BranchName, CommitId};

/// Prefix of refs that name branches.
const BRANCH_REF_PREFIX: &str = "refs/heads/";

/// A push notification from GitHub.
///
/// Unknown fields are ignored; GitHub sends far more than this.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PushEvent {
    /// The full ref that was pushed, e.g. `refs/heads/main` or `refs/tags/v1`.
    #[serde(rename = "ref")]
    pub git_ref: String,

    /// The commit the ref points to after the push.
    pub after: CommitId,

    /// Whether the push deleted the ref.
    #[serde(default)]
    pub deleted: bool,
}

impl PushEvent {
    /// Returns the pushed branch, or `None` if the ref is not a branch.
    pub fn branch(&self) -> Option<BranchName> {
        branch_from_ref(&self.git_ref)
    }
}

/// Extracts the branch name from a ref by stripping the literal `refs/heads/` prefix.
///
/// Branch names containing `/` are preserved whole. Refs outside
/// `refs/heads/` (tags, notes) and the bare prefix yield `None`.
///
/// # Examples
///
/// ```
/// use scv::webhooks::branch_from_ref;
///
/// assert_eq!(branch_from_ref("refs/heads/main").unwrap().as_str(), "main");
/// assert_eq!(
///     branch_from_ref("refs/heads/feature/login").unwrap().as_str(),
///     "feature/login"
/// );
/// assert!(branch_from_ref("refs/tags/v1.0").is_none());
/// ```
pub fn branch_from_ref(git_ref: &str) -> Option<BranchName> {
    git_ref
        .strip_prefix(BRANCH_REF_PREFIX)
        .filter(|branch| !branch.is_empty())
        .map(BranchName::from)
}
