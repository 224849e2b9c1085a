//! MCP session artifact (spec §3 "Session", §4.5).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Client identity negotiated at `initialize` time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientInfo {
    /// Client name.
    pub name: String,
    /// Client version.
    pub version: String,
}

/// An MCP handshake artifact required on every non-initialize request
/// (spec §3 "Session").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Session UUID.
    pub id: String,
    /// Authenticated owner this session belongs to.
    pub owner_id: String,
    /// Negotiated protocol version.
    pub protocol_version: String,
    /// Client-reported identity.
    pub client_info: ClientInfo,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-accessed timestamp; bumped atomically with every `Get`.
    pub last_accessed_at: DateTime<Utc>,
}

impl Session {
    /// Create a freshly handshaked session.
    #[must_use]
    pub fn new(owner_id: impl Into<String>, protocol_version: impl Into<String>, client_info: ClientInfo) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            owner_id: owner_id.into(),
            protocol_version: protocol_version.into(),
            client_info,
            created_at: now,
            last_accessed_at: now,
        }
    }
}
