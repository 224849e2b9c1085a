//! VCS branch resolution (spec §3: "a branch is the current VCS branch").
//!
//! Grounded on `mcb_domain::ports::VcsProvider` (object-safe, implemented by
//! `mcb-providers`' git2-backed adapter), narrowed to the one operation
//! contextd's tool handlers need: resolving the branch that scopes a
//! request's memories, checkpoints and repository index to a project path.
//! The teacher's fuller surface (`list_branches`, `commit_history`,
//! `read_file`, diffing) has no counterpart in this crate's tool catalogue.

use async_trait::async_trait;

use crate::error::Result;

/// Resolves the branch that scopes a request, given the project's working
/// directory on disk.
#[async_trait]
pub trait VcsProvider: Send + Sync {
    /// The current branch name for the repository rooted at or above
    /// `project_path`.
    ///
    /// Implementations MUST return a non-empty name even when `HEAD` is
    /// detached or `project_path` is not a git repository at all — branch
    /// is a scoping key, not a git assertion, and a missing branch must
    /// never block a tool call.
    async fn current_branch(&self, project_path: &str) -> Result<String>;
}
