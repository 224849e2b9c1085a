//! Trackable async operations (spec §3 "Operation", §4.4).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// The closed set of states an operation can be in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationStatus {
    /// Created, not yet picked up by a worker.
    Pending,
    /// A worker called `Started`.
    Running,
    /// Terminal: a worker called `Complete`.
    Completed,
    /// Terminal: a worker called `Error`.
    Failed,
}

impl OperationStatus {
    /// Whether this status is terminal (`Completed` or `Failed`).
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// A server-tracked background task with a stable ID and an event stream
/// (spec §3 "Operation").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Operation {
    /// Operation ID.
    pub id: String,
    /// Authenticated owner who created this operation.
    pub owner_id: String,
    /// Tool name this operation backs.
    pub tool: String,
    /// Parameters the tool call was invoked with.
    pub params: Value,
    /// Trace ID for cross-system correlation.
    pub trace_id: String,
    /// Current lifecycle state.
    pub status: OperationStatus,
    /// Present only once `status == Completed`.
    pub result: Option<Value>,
    /// Present only once `status == Failed`: `(code, message)`.
    pub error: Option<(i64, String)>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-transition timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Operation {
    /// Allocate a new `Pending` operation (spec §4.4 `Create`).
    #[must_use]
    pub fn new(owner_id: impl Into<String>, tool: impl Into<String>, params: Value, trace_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            owner_id: owner_id.into(),
            tool: tool.into(),
            params,
            trace_id: trace_id.into(),
            status: OperationStatus::Pending,
            result: None,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }
}
