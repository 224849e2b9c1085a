//! One function per tool in the spec §6 catalogue. Sync tools return
//! their result directly; async tools build a future and hand it to
//! [`spawn_async_tool`].

use std::sync::Arc;

use serde_json::{Value, json};

use contextd_application::ConsolidateOptions;
use contextd_domain::error::{Error, Result};
use contextd_domain::identity::derive_project_id;

use crate::state::AppState;
use crate::tools::args::*;
use crate::tools::async_ops::spawn_async_tool;

/// version string embedded in `status`/`initialize` responses.
pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

async fn resolve_scope(state: &AppState, project_path: &str) -> Result<(String, String)> {
    let project_id = derive_project_id(project_path);
    let branch = state.vcs.current_branch(project_path).await?;
    Ok((project_id, branch))
}

fn parse_args<T: serde::de::DeserializeOwned>(arguments: Value) -> Result<T> {
    serde_json::from_value(arguments).map_err(|err| Error::invalid_argument(err.to_string()))
}

pub async fn status(state: &AppState, owner_id: &str, arguments: Value) -> Result<Value> {
    let args: StatusArgs = parse_args(arguments)?;
    match args.operation_id {
        None => Ok(json!({"service": "contextd", "status": "running", "version": SERVER_VERSION})),
        Some(operation_id) => {
            let operation = state.registry.get(owner_id, &operation_id).ok_or_else(|| Error::operation_not_found(operation_id))?;
            Ok(json!({
                "status": operation.status,
                "result": operation.result,
                "error": operation.error.map(|(code, message)| json!({"code": code, "message": message})),
                "created_at": operation.created_at,
                "updated_at": operation.updated_at,
            }))
        }
    }
}

pub async fn memory_search(state: &AppState, owner_id: &str, arguments: Value) -> Result<Value> {
    let args: SearchArgs = parse_args(arguments)?;
    let (project_id, branch) = resolve_scope(state, &args.project_path).await?;
    let hits = state.memory.search(owner_id, &project_id, &branch, &args.query, args.limit).await?;
    Ok(serde_json::to_value(hits)?)
}

pub async fn memory_record(state: &AppState, owner_id: &str, arguments: Value) -> Result<Value> {
    let args: MemoryRecordArgs = parse_args(arguments)?;
    let (project_id, branch) = resolve_scope(state, &args.project_path).await?;
    let memory_id = state
        .memory
        .record(owner_id, &project_id, &branch, args.content, args.description, args.project_path.clone())
        .await?;
    Ok(json!({"memory_id": memory_id}))
}

pub async fn memory_feedback(state: &AppState, owner_id: &str, arguments: Value) -> Result<Value> {
    let args: FeedbackArgs = parse_args(arguments)?;
    let (project_id, branch) = resolve_scope(state, &args.project_path).await?;
    state.memory.feedback(owner_id, &project_id, &branch, &args.memory_id, args.delta).await?;
    Ok(Value::Null)
}

pub async fn memory_outcome(state: &AppState, owner_id: &str, arguments: Value) -> Result<Value> {
    let args: OutcomeArgs = parse_args(arguments)?;
    let (project_id, branch) = resolve_scope(state, &args.project_path).await?;
    state.memory.outcome(owner_id, &project_id, &branch, &args.memory_id, args.success).await?;
    Ok(Value::Null)
}

pub fn memory_consolidate(state: &Arc<AppState>, owner_id: &str, trace_id: &str, arguments: Value) -> Result<Value> {
    let args: MemoryConsolidateArgs = parse_args(arguments)?;
    let distiller = Arc::clone(&state.distiller);
    let vcs = Arc::clone(&state.vcs);
    let owner = owner_id.to_owned();
    let raw_params = json!({"project_path": args.project_path, "threshold": args.threshold, "dry_run": args.dry_run, "force_all": args.force_all});
    let project_path = args.project_path;
    let options = ConsolidateOptions { threshold: args.threshold, window_secs: None, dry_run: args.dry_run, force_all: args.force_all };
    let work = async move {
        let project_id = derive_project_id(&project_path);
        let branch = vcs.current_branch(&project_path).await?;
        let outcome = distiller.consolidate(&owner, &project_id, &branch, options).await?;
        Ok(serde_json::to_value(outcome)?)
    };
    Ok(spawn_async_tool(state, owner_id, "memory_consolidate", raw_params, trace_id, work))
}

pub fn checkpoint_save(state: &Arc<AppState>, owner_id: &str, trace_id: &str, arguments: Value) -> Result<Value> {
    let args: CheckpointSaveArgs = parse_args(arguments)?;
    let checkpoint = Arc::clone(&state.checkpoint);
    let vcs = Arc::clone(&state.vcs);
    let owner = owner_id.to_owned();
    let raw_params = json!({"project_path": args.project_path, "metadata": {"summary": args.metadata.summary, "tags": args.metadata.tags}});
    let content = args.content;
    let project_path = args.project_path;
    let summary = args.metadata.summary.unwrap_or_else(|| content.chars().take(80).collect());
    let tags = args.metadata.tags;
    let work = async move {
        let project_id = derive_project_id(&project_path);
        let branch = vcs.current_branch(&project_path).await?;
        let checkpoint_id = checkpoint.save(&owner, &project_id, &branch, content, summary, tags, project_path.clone()).await?;
        Ok(json!({"checkpoint_id": checkpoint_id}))
    };
    Ok(spawn_async_tool(state, owner_id, "checkpoint_save", raw_params, trace_id, work))
}

pub async fn checkpoint_search(state: &AppState, owner_id: &str, arguments: Value) -> Result<Value> {
    let args: SearchArgs = parse_args(arguments)?;
    let (project_id, branch) = resolve_scope(state, &args.project_path).await?;
    let hits = state.checkpoint.search(owner_id, &project_id, &branch, &args.query, args.limit).await?;
    Ok(serde_json::to_value(hits)?)
}

pub async fn checkpoint_list(state: &AppState, owner_id: &str, arguments: Value) -> Result<Value> {
    let args: CheckpointListArgs = parse_args(arguments)?;
    let (project_id, branch) = resolve_scope(state, &args.project_path).await?;
    let checkpoints = state.checkpoint.list(owner_id, &project_id, &branch, args.limit).await?;
    Ok(serde_json::to_value(checkpoints)?)
}

pub async fn checkpoint_resume(state: &AppState, owner_id: &str, arguments: Value) -> Result<Value> {
    let args: CheckpointResumeArgs = parse_args(arguments)?;
    let (project_id, branch) = resolve_scope(state, &args.project_path).await?;
    let checkpoint = state.checkpoint.resume(owner_id, &project_id, &branch, &args.checkpoint_id).await?;
    Ok(serde_json::to_value(checkpoint)?)
}

pub async fn remediation_record(state: &AppState, owner_id: &str, arguments: Value) -> Result<Value> {
    let args: RemediationRecordArgs = parse_args(arguments)?;
    let (project_id, branch) = resolve_scope(state, &args.project_path).await?;
    let remediation_id = state
        .remediation
        .record(owner_id, &project_id, &branch, args.error_msg, args.solution, args.context, args.project_path.clone())
        .await?;
    Ok(json!({"remediation_id": remediation_id}))
}

pub async fn remediation_search(state: &AppState, owner_id: &str, arguments: Value) -> Result<Value> {
    let args: RemediationSearchArgs = parse_args(arguments)?;
    let (project_id, branch) = resolve_scope(state, &args.project_path).await?;
    let hits = state.remediation.search(owner_id, &project_id, &branch, &args.error_msg, args.limit).await?;
    Ok(serde_json::to_value(hits)?)
}

pub async fn remediation_feedback(state: &AppState, owner_id: &str, arguments: Value) -> Result<Value> {
    let args: FeedbackArgs = parse_args(arguments)?;
    let (project_id, branch) = resolve_scope(state, &args.project_path).await?;
    state.remediation.feedback(owner_id, &project_id, &branch, &args.memory_id, args.delta).await?;
    Ok(Value::Null)
}

pub fn troubleshoot_diagnose(state: &Arc<AppState>, owner_id: &str, trace_id: &str, arguments: Value) -> Result<Value> {
    let args: TroubleshootDiagnoseArgs = parse_args(arguments)?;
    let troubleshoot = Arc::clone(&state.troubleshoot);
    let owner = owner_id.to_owned();
    let raw_params = json!({"error_message": args.error_message});
    let work = async move {
        let diagnosis = troubleshoot.diagnose(&owner, &args.error_message, args.context.as_deref()).await?;
        Ok(serde_json::to_value(diagnosis)?)
    };
    Ok(spawn_async_tool(state, owner_id, "troubleshoot_diagnose", raw_params, trace_id, work))
}

pub fn repository_index(state: &Arc<AppState>, owner_id: &str, trace_id: &str, arguments: Value) -> Result<Value> {
    let args: RepositoryIndexArgs = parse_args(arguments)?;
    let repository = Arc::clone(&state.repository);
    let vcs = Arc::clone(&state.vcs);
    let owner = owner_id.to_owned();
    let raw_params = json!({"project_path": args.project_path, "force": args.force});
    let project_path = args.project_path;
    let force = args.force;
    let work = async move {
        let project_id = derive_project_id(&project_path);
        let branch = vcs.current_branch(&project_path).await?;
        let report = repository.index(&owner, &project_id, &branch, &project_path, force).await?;
        Ok(serde_json::to_value(report)?)
    };
    Ok(spawn_async_tool(state, owner_id, "repository_index", raw_params, trace_id, work))
}

pub async fn repository_search(state: &AppState, owner_id: &str, arguments: Value) -> Result<Value> {
    let args: SearchArgs = parse_args(arguments)?;
    let (project_id, branch) = resolve_scope(state, &args.project_path).await?;
    let hits = state.repository.search(owner_id, &project_id, &branch, &args.query, args.limit).await?;
    Ok(serde_json::to_value(hits)?)
}

pub fn collection_create(state: &Arc<AppState>, owner_id: &str, trace_id: &str, arguments: Value) -> Result<Value> {
    let args: CollectionCreateArgs = parse_args(arguments)?;
    let admin = Arc::clone(&state.admin);
    let owner = owner_id.to_owned();
    let raw_params = json!({"collection_name": args.collection_name, "vector_size": args.vector_size});
    let collection_name = args.collection_name;
    let vector_size = args.vector_size;
    let work = async move {
        admin.create_collection(&owner, &collection_name, vector_size).await?;
        Ok(Value::Null)
    };
    Ok(spawn_async_tool(state, owner_id, "collection_create", raw_params, trace_id, work))
}

pub fn collection_delete(state: &Arc<AppState>, owner_id: &str, trace_id: &str, arguments: Value) -> Result<Value> {
    let args: CollectionDeleteArgs = parse_args(arguments)?;
    let admin = Arc::clone(&state.admin);
    let owner = owner_id.to_owned();
    let raw_params = json!({"collection_name": args.collection_name});
    let collection_name = args.collection_name;
    let work = async move {
        admin.delete_collection(&owner, &collection_name).await?;
        Ok(Value::Null)
    };
    Ok(spawn_async_tool(state, owner_id, "collection_delete", raw_params, trace_id, work))
}

pub async fn collection_list(state: &AppState, owner_id: &str) -> Result<Value> {
    let names = state.admin.list_collections(owner_id).await?;
    Ok(serde_json::to_value(names)?)
}
