//! Config section types (spec SPEC_FULL.md §3), one struct per `[section]`.
//!
//! Grounded on the teacher's `config/types/server.rs` convention of a
//! plain `Serialize + Deserialize` struct per concern with `#[serde(default)]`
//! fields, rather than a single flat struct.

use serde::{Deserialize, Serialize};

use contextd_domain::constants::{
    DEFAULT_CONSOLIDATION_THRESHOLD, DEFAULT_CONSOLIDATION_WINDOW_SECS, DEFAULT_DIAL_TIMEOUT_SECS, DEFAULT_RETRY_ATTEMPTS,
    DEFAULT_RPC_TIMEOUT_SECS, DEFAULT_SCHEDULER_INTERVAL_SECS,
};

/// `[server]` — HTTP bind address.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind host.
    pub host: String,
    /// Bind port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".to_owned(), port: 8765 }
    }
}

/// Which [`contextd_domain::ports::VectorStoreProvider`] backend to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VectorStoreProviderKind {
    /// On-disk embedded store (spec §4.3).
    Embedded,
    /// RPC client against an external vector-store service.
    External,
}

/// `[vectorstore]` — backend selection and tuning (spec §4.2).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorStoreConfig {
    /// Which backend to construct.
    pub provider: VectorStoreProviderKind,
    /// Embedded backend: root directory (defaults to
    /// `~/.config/contextd/vectorstore`, resolved by the caller when empty).
    pub path: String,
    /// External backend: base URL.
    pub endpoint: String,
    /// External backend: dial timeout, seconds.
    pub dial_timeout_secs: u64,
    /// External backend: per-RPC timeout, seconds.
    pub rpc_timeout_secs: u64,
    /// External backend: retry attempts for transient errors.
    pub retry_attempts: u32,
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            provider: VectorStoreProviderKind::Embedded,
            path: String::new(),
            endpoint: String::new(),
            dial_timeout_secs: DEFAULT_DIAL_TIMEOUT_SECS,
            rpc_timeout_secs: DEFAULT_RPC_TIMEOUT_SECS,
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
        }
    }
}

/// `[distiller]` — consolidation defaults (spec §4.9).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DistillerConfig {
    /// Clustering similarity threshold.
    pub threshold: f32,
    /// Consolidation window, seconds.
    pub window_secs: i64,
    /// Scheduler firing interval, seconds.
    pub schedule_interval_secs: i64,
}

impl Default for DistillerConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_CONSOLIDATION_THRESHOLD,
            window_secs: DEFAULT_CONSOLIDATION_WINDOW_SECS,
            schedule_interval_secs: DEFAULT_SCHEDULER_INTERVAL_SECS,
        }
    }
}

/// `[scrubber]` — the ruleset itself is the opaque external collaborator;
/// this only toggles whether the wrapper runs at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrubberConfig {
    /// Whether outbound tool results are scrubbed.
    pub enabled: bool,
}

impl Default for ScrubberConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}
