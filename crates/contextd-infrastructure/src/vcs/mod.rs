//! git2-backed [`VcsProvider`](contextd_domain::ports::VcsProvider)
//! (spec §3: "a branch is the current VCS branch").
//!
//! Grounded on the teacher's `mcb-providers` git2 adapter (`Repository`
//! discovery plus `HEAD` inspection), narrowed to branch resolution only.

use async_trait::async_trait;
use git2::Repository;

use contextd_domain::constants::DEFAULT_BRANCH;
use contextd_domain::error::Result;
use contextd_domain::ports::VcsProvider;

/// Resolves the current branch via `git2`, walking up from `project_path`
/// to find the enclosing repository the way `git` itself does.
#[derive(Debug, Clone, Default)]
pub struct Git2VcsProvider;

impl Git2VcsProvider {
    /// Build a new provider. Stateless — every call re-discovers the
    /// repository, since the project path can point at a different
    /// worktree on every request.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl VcsProvider for Git2VcsProvider {
    async fn current_branch(&self, project_path: &str) -> Result<String> {
        let project_path = project_path.to_owned();
        let branch = tokio::task::spawn_blocking(move || resolve_branch(&project_path))
            .await
            .map_err(|err| contextd_domain::error::Error::internal(format!("vcs task join error: {err}")))?;
        Ok(branch)
    }
}

/// Never fails: an unresolvable repository, detached `HEAD`, or I/O error
/// all degrade to a usable scoping key instead of blocking the tool call.
fn resolve_branch(project_path: &str) -> String {
    let Ok(repo) = Repository::discover(project_path) else {
        return DEFAULT_BRANCH.to_owned();
    };
    let Ok(head) = repo.head() else {
        return DEFAULT_BRANCH.to_owned();
    };
    if head.is_branch() {
        if let Some(name) = head.shorthand() {
            return name.to_owned();
        }
    }
    match head.target() {
        Some(oid) => oid.to_string().chars().take(12).collect(),
        None => DEFAULT_BRANCH.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn non_repository_path_falls_back_to_default_branch() {
        let dir = tempfile::tempdir().unwrap();
        let provider = Git2VcsProvider::new();
        let branch = provider.current_branch(dir.path().to_str().unwrap()).await.unwrap();
        assert_eq!(branch, DEFAULT_BRANCH);
    }

    #[tokio::test]
    async fn checked_out_branch_is_resolved() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        let signature = git2::Signature::now("test", "test@example.com").unwrap();
        let tree_id = repo.index().unwrap().write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();
        let commit_id = repo.commit(Some("HEAD"), &signature, &signature, "initial", &tree, &[]).unwrap();
        let commit = repo.find_commit(commit_id).unwrap();
        repo.branch("feature-x", &commit, false).unwrap();
        repo.set_head("refs/heads/feature-x").unwrap();

        let provider = Git2VcsProvider::new();
        let branch = provider.current_branch(dir.path().to_str().unwrap()).await.unwrap();
        assert_eq!(branch, "feature-x");
    }
}
