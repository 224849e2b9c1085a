//! Shared server state: every service the tool catalogue dispatches
//! into, plus the session/operation/event machinery the transport layer
//! owns directly (spec §3 "Ownership summary").

use std::sync::Arc;

use contextd_application::{AdminService, CheckpointService, Distiller, MemoryService, RemediationService, RepositoryService, Scheduler, TroubleshootService};
use contextd_domain::ports::{SecretScanner, VcsProvider, VectorStoreProvider};
use contextd_infrastructure::{EventBus, OperationRegistry, SessionStore};

/// Everything a tool handler or transport endpoint needs, held behind
/// `Arc` and cloned cheaply per request.
pub struct AppState {
    /// Active MCP sessions.
    pub sessions: Arc<SessionStore>,
    /// In-flight and recently-terminal async operations.
    pub registry: Arc<OperationRegistry>,
    /// Operation lifecycle event bus, also used directly by the SSE
    /// endpoint.
    pub events: Arc<EventBus>,
    /// Resolves the current VCS branch for a project path.
    pub vcs: Arc<dyn VcsProvider>,
    /// Used directly by `GET /health` for a best-effort store health check;
    /// every other vector-store access goes through a service above.
    pub vector_store: Arc<dyn VectorStoreProvider>,
    /// Redacts secrets from outbound tool results (spec §4.10).
    pub secret_scanner: Arc<dyn SecretScanner>,
    /// `[scrubber].enabled` from config; when false, tool results are
    /// returned unscrubbed (the ruleset itself is still opaque/out of
    /// scope, this only toggles the wrapper).
    pub scrub_enabled: bool,
    /// Memory CRUD/search/consolidation-aware search.
    pub memory: Arc<MemoryService>,
    /// Checkpoint CRUD.
    pub checkpoint: Arc<CheckpointService>,
    /// Remediation CRUD.
    pub remediation: Arc<RemediationService>,
    /// Repository indexing/search.
    pub repository: Arc<RepositoryService>,
    /// Collection admin operations.
    pub admin: Arc<AdminService>,
    /// Error troubleshooting.
    pub troubleshoot: Arc<TroubleshootService>,
    /// Consolidation engine, invoked directly by the `memory_consolidate`
    /// tool handler (the background scheduler also holds an `Arc` to the
    /// same instance).
    pub distiller: Arc<Distiller>,
    /// Background consolidation scheduler, started/stopped by the binary.
    pub scheduler: Arc<Scheduler>,
}
