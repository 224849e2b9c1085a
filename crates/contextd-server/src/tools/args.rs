//! Per-tool argument shapes (spec §6 tool catalogue). Field casing
//! follows the literal `checkpoint_save` wire example in spec §8
//! scenario (f) — snake_case — not the table's camelCase gloss (see
//! `DESIGN.md`).

use schemars::JsonSchema;
use serde::Deserialize;

fn default_limit() -> usize {
    10
}

/// `memory_search` / `checkpoint_search` / `repository_search` share this
/// shape.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct SearchArgs {
    /// Query text to embed and search with.
    pub query: String,
    /// Absolute path of the project this search is scoped to.
    pub project_path: String,
    /// Max results to return.
    #[serde(default = "default_limit")]
    pub limit: usize,
}

/// `memory_record`.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct MemoryRecordArgs {
    /// The strategy/lesson text.
    pub content: String,
    /// Short summary.
    #[serde(default)]
    pub description: String,
    /// Absolute path of the owning project.
    pub project_path: String,
}

/// `memory_feedback` / `remediation_feedback`. Not listed with
/// `project_path` in the table's gloss, but required to locate the
/// record's collection (see `DESIGN.md`).
#[derive(Debug, Deserialize, JsonSchema)]
pub struct FeedbackArgs {
    /// Target record ID.
    pub memory_id: String,
    /// `+1`/`-1` (or any signed delta) applied to confidence.
    pub delta: f32,
    /// Absolute path of the owning project.
    pub project_path: String,
}

/// `memory_outcome`.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct OutcomeArgs {
    /// Target memory ID.
    pub memory_id: String,
    /// Whether applying this memory's advice succeeded.
    pub success: bool,
    /// Absolute path of the owning project.
    pub project_path: String,
}

/// `memory_consolidate`.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct MemoryConsolidateArgs {
    /// Absolute path of the project to consolidate.
    pub project_path: String,
    /// Clustering similarity threshold override.
    pub threshold: Option<f32>,
    /// Rank clusters without persisting anything.
    #[serde(default)]
    pub dry_run: bool,
    /// Bypass the consolidation window check.
    #[serde(default)]
    pub force_all: bool,
}

/// Optional `checkpoint_save` metadata.
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct CheckpointMetadata {
    /// Short summary; defaults to a truncated prefix of `content` when
    /// omitted.
    pub summary: Option<String>,
    /// Free-form tags.
    #[serde(default)]
    pub tags: Vec<String>,
}

/// `checkpoint_save`.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct CheckpointSaveArgs {
    /// Full content to save.
    pub content: String,
    /// Absolute path of the owning project.
    pub project_path: String,
    /// Optional summary/tags.
    #[serde(default)]
    pub metadata: CheckpointMetadata,
}

/// `checkpoint_list`.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct CheckpointListArgs {
    /// Absolute path of the owning project.
    pub project_path: String,
    /// Max results to return.
    #[serde(default = "default_limit")]
    pub limit: usize,
}

/// `checkpoint_resume`.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct CheckpointResumeArgs {
    /// The checkpoint ID to resume.
    pub checkpoint_id: String,
    /// Absolute path of the owning project.
    pub project_path: String,
}

/// `remediation_record`.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct RemediationRecordArgs {
    /// The error message/signature this remediation addresses.
    pub error_msg: String,
    /// The fix that resolved it.
    pub solution: String,
    /// Optional surrounding context.
    pub context: Option<String>,
    /// Absolute path of the owning project.
    pub project_path: String,
}

/// `remediation_search`.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct RemediationSearchArgs {
    /// Error message/signature to match against.
    pub error_msg: String,
    /// Absolute path of the owning project.
    pub project_path: String,
    /// Max results to return.
    #[serde(default = "default_limit")]
    pub limit: usize,
}

/// `troubleshoot_diagnose`. No `project_path` — troubleshooting is scoped
/// owner-wide (see `DESIGN.md`).
#[derive(Debug, Deserialize, JsonSchema)]
pub struct TroubleshootDiagnoseArgs {
    /// The error message to diagnose.
    pub error_message: String,
    /// Optional surrounding context.
    pub context: Option<String>,
}

/// `repository_index`.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct RepositoryIndexArgs {
    /// Absolute path of the project to index.
    pub project_path: String,
    /// Re-index even if already indexed.
    #[serde(default)]
    pub force: bool,
}

/// `collection_create`.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct CollectionCreateArgs {
    /// Fully-qualified collection name (`owner_<id>/project_<id>/<branch>`).
    pub collection_name: String,
    /// Fixed embedding dimension for the collection. `0` uses the store's
    /// configured default.
    #[serde(default)]
    pub vector_size: usize,
}

/// `collection_delete`.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct CollectionDeleteArgs {
    /// Fully-qualified collection name.
    pub collection_name: String,
}

/// `status`. Dual-mode (see `DESIGN.md`): omit `operation_id` for a
/// service health snapshot, supply it to poll an async operation.
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct StatusArgs {
    /// The operation ID previously returned by an async tool call.
    pub operation_id: Option<String>,
}

/// `collection_list`. Takes no input.
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct CollectionListArgs {}
