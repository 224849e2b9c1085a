//! Server-side owner identity (spec §6: "authentication is derived
//! server-side from the OS-level current user; `X-Owner-ID` is always
//! ignored").
//!
//! There's no teacher precedent for an OS-current-user lookup (the
//! teacher always receives identity from an upstream auth layer); this
//! is a thin standard-library boundary read, not an ecosystem concern
//! worth a dependency (see `DESIGN.md`).

use contextd_domain::identity::derive_owner_id;

/// Read the OS-reported current username, the way a login shell would.
#[must_use]
pub fn current_username() -> String {
    std::env::var("USER").or_else(|_| std::env::var("USERNAME")).unwrap_or_else(|_| "unknown".to_owned())
}

/// Derive this process's owner ID from the OS-level current user.
///
/// Any `X-Owner-ID` header on the request MUST be ignored — this is the
/// only path an owner ID is ever produced on.
#[must_use]
pub fn resolve_owner_id() -> String {
    derive_owner_id(&current_username())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_owner_id_is_stable_across_calls() {
        assert_eq!(resolve_owner_id(), resolve_owner_id());
    }
}
