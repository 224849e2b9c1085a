//! Defaults named throughout the spec. Kept as named constants rather than
//! inline literals so the distiller and vector-store adapters read like
//! the spec, not like magic numbers.

/// Default distiller clustering similarity threshold (spec §4.9).
pub const DEFAULT_CONSOLIDATION_THRESHOLD: f32 = 0.80;

/// Default per-project consolidation window, in seconds (spec §4.9: 24h).
pub const DEFAULT_CONSOLIDATION_WINDOW_SECS: i64 = 24 * 60 * 60;

/// Default scheduler firing interval, in seconds (spec §4.9: once per day).
pub const DEFAULT_SCHEDULER_INTERVAL_SECS: i64 = 24 * 60 * 60;

/// Ranking boost applied to consolidated memories during search (spec §4.8).
pub const CONSOLIDATION_BOOST: f32 = 1.20;

/// Multiplier applied to `limit` when issuing the underlying vector search,
/// to leave room for archived-memory filtering (spec §4.8).
pub const SEARCH_CANDIDATE_MULTIPLIER: usize = 2;

/// Floor under the usage-count weight in the consolidated confidence
/// formula (spec §4.9 step 5); MUST NOT be zero.
pub const USAGE_WEIGHT_FLOOR: u32 = 1;

/// Per-cluster-member consensus bonus increment (spec §4.9 step 5).
pub const CONSENSUS_BONUS_PER_MEMBER: f32 = 0.10;

/// Cap on the total consensus bonus (spec §4.9 step 5).
pub const CONSENSUS_BONUS_CAP: f32 = 0.20;

/// Default mid-value confidence assigned to a freshly recorded memory.
pub const DEFAULT_MEMORY_CONFIDENCE: f32 = 0.5;

/// Seconds a terminal operation is retained before cleanup (spec §3: 1h).
pub const OPERATION_RETENTION_SECS: i64 = 60 * 60;

/// SSE heartbeat interval, in seconds (spec §4.7).
pub const SSE_HEARTBEAT_SECS: u64 = 30;

/// Default retry attempts for transient external-backend errors (spec §4.2).
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;

/// Initial retry backoff, in milliseconds, doubling each attempt (spec §4.2).
pub const RETRY_INITIAL_BACKOFF_MS: u64 = 1_000;

/// Default external backend dial timeout, in seconds (spec §5).
pub const DEFAULT_DIAL_TIMEOUT_SECS: u64 = 5;

/// Default per-RPC timeout, in seconds (spec §5).
pub const DEFAULT_RPC_TIMEOUT_SECS: u64 = 30;

/// Default vector dimension substituted when `CreateCollection` is asked
/// for dimension 0 (spec §4.2).
pub const DEFAULT_VECTOR_DIMENSION: usize = 384;

/// MCP protocol versions this server understands, newest last.
pub const SUPPORTED_PROTOCOL_VERSIONS: &[&str] = &["2024-11-05"];

/// Branch name substituted when a project path isn't a git repository, or
/// its `HEAD` can't be resolved to a named branch (spec §3).
pub const DEFAULT_BRANCH: &str = "main";

/// Confidence delta applied by `memory_outcome` on a reported success,
/// smaller than an explicit human `feedback` call since it's an
/// unsupervised signal (see `DESIGN.md`).
pub const OUTCOME_SUCCESS_DELTA: f32 = 0.05;

/// Confidence delta applied by `memory_outcome` on a reported failure.
pub const OUTCOME_FAILURE_DELTA: f32 = -0.05;
