//! Owner/project/branch identity and collection naming (spec §4.1).
//!
//! Grounded on `mcb-domain/src/utils/id.rs`'s hashing helpers, generalized
//! to the owner/project/branch scoping model this crate is built around.

use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

/// Derive a stable, per-user owner ID from an OS-level username.
///
/// SHA-256 of the UTF-8 username, hex-encoded lowercase, 64 characters.
/// Never trusted from user-controlled input — callers must pass the
/// server-resolved OS username, never a header value.
#[must_use]
pub fn derive_owner_id(username: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(username.as_bytes());
    hex::encode(hasher.finalize())
}

/// Derive a project ID from its absolute path.
#[must_use]
pub fn derive_project_id(absolute_path: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(absolute_path.as_bytes());
    hex::encode(hasher.finalize())
}

/// Sanitize a VCS branch name for use inside a collection name: every `/`
/// becomes `_` (spec §3, "Project and Branch").
#[must_use]
pub fn sanitize_branch(branch: &str) -> String {
    branch.replace('/', "_")
}

/// A parsed `owner_<ownerID>/project_<projectID>/<branch>` collection name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionName {
    /// The owner ID segment, without the `owner_` prefix.
    pub owner_id: String,
    /// The project ID segment, without the `project_` prefix.
    pub project_id: String,
    /// The sanitized branch segment.
    pub branch: String,
}

impl CollectionName {
    /// Build the canonical three-part name for a given owner/project/branch.
    ///
    /// The branch is sanitized per [`sanitize_branch`]; the resulting name
    /// is immutable after creation (spec §3).
    #[must_use]
    pub fn new(owner_id: &str, project_id: &str, branch: &str) -> Self {
        Self {
            owner_id: owner_id.to_owned(),
            project_id: project_id.to_owned(),
            branch: sanitize_branch(branch),
        }
    }

    /// Render as `owner_<ownerID>/project_<projectID>/<branch>`.
    #[must_use]
    pub fn to_string_name(&self) -> String {
        format!(
            "owner_{}/project_{}/{}",
            self.owner_id, self.project_id, self.branch
        )
    }

    /// Parse a collection name of the form
    /// `owner_<ownerID>/project_<projectID>/<branch>`.
    ///
    /// Requires exactly three non-empty `/`-separated parts, the first two
    /// carrying their literal `owner_`/`project_` prefixes.
    pub fn parse(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split('/').collect();
        if parts.len() != 3 || parts.iter().any(|p| p.is_empty()) {
            return Err(Error::invalid_collection_name(s));
        }
        let owner_id = parts[0]
            .strip_prefix("owner_")
            .ok_or_else(|| Error::invalid_collection_name(s))?;
        let project_id = parts[1]
            .strip_prefix("project_")
            .ok_or_else(|| Error::invalid_collection_name(s))?;
        if owner_id.is_empty() || project_id.is_empty() {
            return Err(Error::invalid_collection_name(s));
        }
        Ok(Self {
            owner_id: owner_id.to_owned(),
            project_id: project_id.to_owned(),
            branch: parts[2].to_owned(),
        })
    }
}

/// Parse a `collection://owner_<ownerID>/project_<projectID>/<branch>` URI.
///
/// Returns `(ownerID, collectionName)`. Ownership is *not* checked here —
/// callers MUST re-verify `ownerID` against the authenticated context on
/// every access (spec §4.1).
pub fn parse_collection_uri(uri: &str) -> Result<(String, String)> {
    let rest = uri
        .strip_prefix("collection://")
        .ok_or_else(|| Error::invalid_argument(format!("not a collection URI: {uri}")))?;
    let parsed = CollectionName::parse(rest)
        .map_err(|_| Error::invalid_argument(format!("not a collection URI: {uri}")))?;
    Ok((parsed.owner_id.clone(), parsed.to_string_name()))
}

/// Render a collection name as its `collection://` URI form.
#[must_use]
pub fn collection_uri(name: &CollectionName) -> String {
    format!("collection://{}", name.to_string_name())
}
