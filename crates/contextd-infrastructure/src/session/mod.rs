//! In-memory MCP session store (spec §4.5).
//!
//! `Get` bumps `last_accessed_at` atomically with the read — `DashMap`'s
//! `get_mut` gives us the same per-entry-locked read-modify-write the
//! spec requires without a store-wide lock, matching the registry's and
//! teacher's general concurrent-map convention.

use dashmap::DashMap;

use contextd_domain::entities::Session;

/// Holds every active MCP session. Restart loses all sessions by design
/// (spec §4.5: "in-memory only").
#[derive(Default)]
pub struct SessionStore {
    sessions: DashMap<String, Session>,
}

impl SessionStore {
    /// Build an empty session store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `Create(ownerID, initializeParams) -> Session` (spec §4.5).
    #[must_use]
    pub fn create(&self, session: Session) -> Session {
        self.sessions.insert(session.id.clone(), session.clone());
        session
    }

    /// `Get(sessionID) -> Session | nil`, bumping `last_accessed_at`
    /// atomically with the read.
    #[must_use]
    pub fn get(&self, session_id: &str) -> Option<Session> {
        let mut entry = self.sessions.get_mut(session_id)?;
        entry.last_accessed_at = chrono::Utc::now();
        Some(entry.value().clone())
    }

    /// `Delete(sessionID)`.
    pub fn delete(&self, session_id: &str) {
        self.sessions.remove(session_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contextd_domain::entities::ClientInfo;

    fn sample_session() -> Session {
        Session::new("owner-1", "2024-11-05", ClientInfo { name: "test-client".to_owned(), version: "1.0".to_owned() })
    }

    #[test]
    fn create_then_get_round_trips() {
        let store = SessionStore::new();
        let session = store.create(sample_session());
        let fetched = store.get(&session.id).unwrap();
        assert_eq!(fetched.id, session.id);
    }

    #[test]
    fn get_bumps_last_accessed_at() {
        let store = SessionStore::new();
        let session = store.create(sample_session());
        let first = store.get(&session.id).unwrap().last_accessed_at;
        std::thread::sleep(std::time::Duration::from_millis(5));
        let second = store.get(&session.id).unwrap().last_accessed_at;
        assert!(second >= first);
    }

    #[test]
    fn delete_removes_session() {
        let store = SessionStore::new();
        let session = store.create(sample_session());
        store.delete(&session.id);
        assert!(store.get(&session.id).is_none());
    }

    #[test]
    fn get_unknown_session_is_none() {
        let store = SessionStore::new();
        assert!(store.get("nonexistent").is_none());
    }
}
