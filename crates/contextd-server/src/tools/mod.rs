//! Tool catalogue (spec §6) and `tools/call` dispatch.
//!
//! Each tool's JSON-RPC input schema is generated straight from its
//! [`args`] struct via `schemars::schema_for!`, so the catalogue and the
//! handler that parses the arguments can never drift apart.

pub mod args;
pub mod async_ops;
pub mod handlers;

use std::sync::Arc;

use schemars::schema_for;
use serde_json::{Value, json};

use contextd_domain::error::{Error, Result};

use crate::state::AppState;

/// One entry in the `tools/list` response.
struct ToolSpec {
    name: &'static str,
    description: &'static str,
    input_schema: Value,
}

fn spec<T: schemars::JsonSchema>(name: &'static str, description: &'static str) -> ToolSpec {
    ToolSpec { name, description, input_schema: serde_json::to_value(schema_for!(T)).unwrap_or(Value::Null) }
}

fn catalogue() -> Vec<ToolSpec> {
    use args::*;
    vec![
        spec::<StatusArgs>("status", "Report service health, or poll an async operation by ID"),
        spec::<SearchArgs>("memory_search", "Search recorded memories for a project and branch"),
        spec::<MemoryRecordArgs>("memory_record", "Record a new memory"),
        spec::<FeedbackArgs>("memory_feedback", "Adjust a memory's confidence"),
        spec::<OutcomeArgs>("memory_outcome", "Record whether applying a memory succeeded"),
        spec::<MemoryConsolidateArgs>("memory_consolidate", "Cluster and distill related memories"),
        spec::<CheckpointSaveArgs>("checkpoint_save", "Save a work-in-progress checkpoint"),
        spec::<SearchArgs>("checkpoint_search", "Search saved checkpoints"),
        spec::<CheckpointListArgs>("checkpoint_list", "List recent checkpoints"),
        spec::<CheckpointResumeArgs>("checkpoint_resume", "Resume a saved checkpoint by ID"),
        spec::<RemediationRecordArgs>("remediation_record", "Record an error and the fix that resolved it"),
        spec::<RemediationSearchArgs>("remediation_search", "Search recorded remediations by error message"),
        spec::<FeedbackArgs>("remediation_feedback", "Adjust a remediation's confidence"),
        spec::<TroubleshootDiagnoseArgs>("troubleshoot_diagnose", "Diagnose an error against recorded remediations"),
        spec::<RepositoryIndexArgs>("repository_index", "Index a project's repository for search"),
        spec::<SearchArgs>("repository_search", "Search an indexed repository"),
        spec::<CollectionCreateArgs>("collection_create", "Create a vector collection"),
        spec::<CollectionDeleteArgs>("collection_delete", "Delete a vector collection"),
        spec::<CollectionListArgs>("collection_list", "List the caller's collections"),
    ]
}

/// Build the `tools/list` response body.
#[must_use]
pub fn list() -> Value {
    let tools: Vec<Value> = catalogue()
        .into_iter()
        .map(|t| json!({"name": t.name, "description": t.description, "inputSchema": t.input_schema}))
        .collect();
    json!({"tools": tools})
}

/// Dispatch a `tools/call` to its handler.
///
/// Async tools (`memory_consolidate`, `checkpoint_save`,
/// `troubleshoot_diagnose`, `repository_index`, `collection_create`,
/// `collection_delete`) already return the `{operation_id, status}`
/// envelope synchronously — their worker future is spawned, not awaited,
/// by [`async_ops::spawn_async_tool`].
pub async fn dispatch(state: &Arc<AppState>, owner_id: &str, trace_id: &str, name: &str, arguments: Value) -> Result<Value> {
    match name {
        "status" => handlers::status(state, owner_id, arguments).await,
        "memory_search" => handlers::memory_search(state, owner_id, arguments).await,
        "memory_record" => handlers::memory_record(state, owner_id, arguments).await,
        "memory_feedback" => handlers::memory_feedback(state, owner_id, arguments).await,
        "memory_outcome" => handlers::memory_outcome(state, owner_id, arguments).await,
        "memory_consolidate" => handlers::memory_consolidate(state, owner_id, trace_id, arguments),
        "checkpoint_save" => handlers::checkpoint_save(state, owner_id, trace_id, arguments),
        "checkpoint_search" => handlers::checkpoint_search(state, owner_id, arguments).await,
        "checkpoint_list" => handlers::checkpoint_list(state, owner_id, arguments).await,
        "checkpoint_resume" => handlers::checkpoint_resume(state, owner_id, arguments).await,
        "remediation_record" => handlers::remediation_record(state, owner_id, arguments).await,
        "remediation_search" => handlers::remediation_search(state, owner_id, arguments).await,
        "remediation_feedback" => handlers::remediation_feedback(state, owner_id, arguments).await,
        "troubleshoot_diagnose" => handlers::troubleshoot_diagnose(state, owner_id, trace_id, arguments),
        "repository_index" => handlers::repository_index(state, owner_id, trace_id, arguments),
        "repository_search" => handlers::repository_search(state, owner_id, arguments).await,
        "collection_create" => handlers::collection_create(state, owner_id, trace_id, arguments),
        "collection_delete" => handlers::collection_delete(state, owner_id, trace_id, arguments),
        "collection_list" => handlers::collection_list(state, owner_id).await,
        other => Err(Error::invalid_argument(format!("unknown tool: {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalogue_lists_every_tool_exactly_once() {
        let names: Vec<&str> = catalogue().into_iter().map(|t| t.name).collect();
        assert_eq!(names.len(), 19);
        let mut sorted = names.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), names.len(), "duplicate tool name in catalogue");
    }

    #[tokio::test]
    async fn dispatch_unknown_tool_is_invalid_params() {
        let err = Error::invalid_argument("unknown tool: not_a_real_tool");
        assert!(matches!(err, Error::InvalidArgument { .. }));
    }
}
