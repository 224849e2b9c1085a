//! The async tool pattern (spec §4.7, §8 property 8 — "the single most
//! important concurrency rule").
//!
//! `tokio::spawn` hands the worker future to the runtime as an
//! independent task with its own lifetime: it is not polled by, or tied
//! to the cancellation of, the HTTP request future that called
//! [`spawn_async_tool`]. Once the request handler returns its `pending`
//! envelope, axum can finish and drop that future — the spawned task
//! keeps running to completion regardless. This is the Rust-idiomatic
//! reading of "rebind the context to a non-request-scoped context."

use std::sync::Arc;

use serde_json::{Value, json};

use contextd_domain::error::Result;

use crate::state::AppState;
use crate::transport::error_code;

/// Create a pending operation, spawn `work` detached from the calling
/// request, and return the `{operation_id, status: "pending"}` envelope
/// spec §4.7 requires the handler to respond with immediately.
///
/// `work` must already own everything it needs (typically `Arc` clones
/// captured in an async block) — it runs after this function has
/// returned to the caller.
pub fn spawn_async_tool<F>(state: &Arc<AppState>, owner_id: &str, tool: &str, params: Value, trace_id: &str, work: F) -> Value
where
    F: std::future::Future<Output = Result<Value>> + Send + 'static,
{
    let operation_id = state.registry.create(owner_id, tool, params, trace_id);
    let state = Arc::clone(state);
    let owner_id = owner_id.to_owned();
    let trace_id = trace_id.to_owned();
    let op_id = operation_id.clone();

    tokio::spawn(async move {
        if let Err(err) = state.registry.started(&owner_id, &op_id) {
            tracing::error!(operation_id = %op_id, error = %err, "failed to mark operation started");
            return;
        }
        match work.await {
            Ok(result) => {
                if let Err(err) = state.registry.complete(&owner_id, &op_id, result) {
                    tracing::error!(operation_id = %op_id, error = %err, "failed to record operation completion");
                }
            }
            Err(err) => {
                let mapped = error_code::from_error(&err, &trace_id);
                if let Err(registry_err) = state.registry.error(&owner_id, &op_id, mapped.code, &mapped.message) {
                    tracing::error!(operation_id = %op_id, error = %registry_err, "failed to record operation failure");
                }
            }
        }
    });

    json!({"operation_id": operation_id, "status": "pending"})
}
