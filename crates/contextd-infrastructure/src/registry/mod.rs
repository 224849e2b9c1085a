//! Operation Registry (spec §4.4): turns long-running tool invocations into
//! trackable, observable operations.
//!
//! Grounded on the teacher's general `dashmap`-backed concurrent-map
//! convention (e.g. `mcb-application`'s decorator state, `distiller`'s
//! per-project timestamps) plus spec §4.4's own public contract table,
//! which has no direct teacher analog (the teacher has no operation
//! registry concept).

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use serde_json::{Value, json};

use contextd_domain::constants::OPERATION_RETENTION_SECS;
use contextd_domain::entities::{Operation, OperationStatus};
use contextd_domain::error::{Error, Result};

use crate::events::{EventBus, OperationEvent, OperationEventKind};

/// Tracks every in-flight and recently-terminal operation, publishing
/// lifecycle events to an [`EventBus`] as they transition.
pub struct OperationRegistry {
    operations: Arc<DashMap<String, Operation>>,
    events: Arc<EventBus>,
}

impl OperationRegistry {
    /// Build a registry publishing to the given event bus.
    #[must_use]
    pub fn new(events: Arc<EventBus>) -> Self {
        Self { operations: Arc::new(DashMap::new()), events }
    }

    /// `Create(ctx, tool, params) -> opID` (spec §4.4).
    #[must_use]
    pub fn create(&self, owner_id: &str, tool: &str, params: Value, trace_id: &str) -> String {
        let operation = Operation::new(owner_id, tool, params, trace_id);
        let id = operation.id.clone();
        self.operations.insert(id.clone(), operation);
        id
    }

    /// `Started(opID)`: pending→running. Errors if absent or not pending.
    pub fn started(&self, owner_id: &str, operation_id: &str) -> Result<()> {
        let mut entry = self.owned_entry(owner_id, operation_id)?;
        if entry.status != OperationStatus::Pending {
            return Err(Error::invalid_argument(format!("operation {operation_id} is not pending")));
        }
        entry.status = OperationStatus::Running;
        entry.updated_at = Utc::now();
        self.publish(owner_id, operation_id, OperationEventKind::Started, Value::Null);
        Ok(())
    }

    /// `Progress(opID, percent, msg)`: publishes only, no status change.
    pub fn progress(&self, owner_id: &str, operation_id: &str, percent: u8, message: &str) -> Result<()> {
        self.owned_entry(owner_id, operation_id)?;
        self.publish(owner_id, operation_id, OperationEventKind::Progress, json!({"percent": percent, "message": message}));
        Ok(())
    }

    /// `Log(opID, level, msg)`.
    pub fn log(&self, owner_id: &str, operation_id: &str, level: &str, message: &str) -> Result<()> {
        self.owned_entry(owner_id, operation_id)?;
        self.publish(owner_id, operation_id, OperationEventKind::Log, json!({"level": level, "message": message}));
        Ok(())
    }

    /// `Error(opID, code, err)`: terminal, publishes, schedules cleanup.
    pub fn error(&self, owner_id: &str, operation_id: &str, code: i64, message: &str) -> Result<()> {
        let mut entry = self.owned_entry(owner_id, operation_id)?;
        entry.status = OperationStatus::Failed;
        entry.error = Some((code, message.to_owned()));
        entry.updated_at = Utc::now();
        drop(entry);
        self.publish(owner_id, operation_id, OperationEventKind::Error, json!({"code": code, "message": message}));
        self.schedule_cleanup(operation_id);
        Ok(())
    }

    /// `Complete(opID, result)`: terminal, publishes, schedules cleanup.
    pub fn complete(&self, owner_id: &str, operation_id: &str, result: Value) -> Result<()> {
        let mut entry = self.owned_entry(owner_id, operation_id)?;
        entry.status = OperationStatus::Completed;
        entry.result = Some(result.clone());
        entry.updated_at = Utc::now();
        drop(entry);
        self.publish(owner_id, operation_id, OperationEventKind::Completed, result);
        self.schedule_cleanup(operation_id);
        Ok(())
    }

    /// `Get(opID) -> op`. Ownership mismatches yield `NotFound`, never
    /// `AuthError`, to avoid leaking existence (spec §4.4).
    #[must_use]
    pub fn get(&self, owner_id: &str, operation_id: &str) -> Option<Operation> {
        self.operations
            .get(operation_id)
            .filter(|entry| entry.owner_id == owner_id)
            .map(|entry| entry.value().clone())
    }

    fn owned_entry<'a>(&'a self, owner_id: &str, operation_id: &str) -> Result<dashmap::mapref::one::RefMut<'a, String, Operation>> {
        let entry = self.operations.get_mut(operation_id).ok_or_else(|| Error::operation_not_found(operation_id))?;
        if entry.owner_id != owner_id {
            return Err(Error::operation_not_found(operation_id));
        }
        Ok(entry)
    }

    fn publish(&self, owner_id: &str, operation_id: &str, kind: OperationEventKind, payload: Value) {
        self.events.publish(OperationEvent {
            operation_id: operation_id.to_owned(),
            owner_id: owner_id.to_owned(),
            kind,
            payload,
            timestamp: Utc::now(),
        });
    }

    /// Delete the in-memory record exactly once after the retention window
    /// (spec §4.4: 1h). Not cancellable — a terminal operation's record is
    /// always reclaimed eventually even if the process later shuts down and
    /// restarts (the registry is in-memory only, so this is moot across
    /// restarts, but within one process lifetime it always fires).
    fn schedule_cleanup(&self, operation_id: &str) {
        let operations = Arc::clone(&self.operations);
        let operation_id = operation_id.to_owned();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_secs(OPERATION_RETENTION_SECS as u64)).await;
            operations.remove(&operation_id);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> OperationRegistry {
        OperationRegistry::new(Arc::new(EventBus::new()))
    }

    #[test]
    fn create_then_get_round_trips() {
        let reg = registry();
        let id = reg.create("alice", "memory_search", Value::Null, "trace-1");
        let op = reg.get("alice", &id).unwrap();
        assert_eq!(op.status, OperationStatus::Pending);
    }

    #[test]
    fn get_by_wrong_owner_is_not_found() {
        let reg = registry();
        let id = reg.create("alice", "memory_search", Value::Null, "trace-1");
        assert!(reg.get("bob", &id).is_none());
    }

    #[test]
    fn started_twice_errors() {
        let reg = registry();
        let id = reg.create("alice", "checkpoint_save", Value::Null, "trace-1");
        reg.started("alice", &id).unwrap();
        assert!(reg.started("alice", &id).is_err());
    }

    #[tokio::test]
    async fn complete_transitions_to_terminal_and_records_result() {
        let reg = registry();
        let id = reg.create("alice", "checkpoint_save", Value::Null, "trace-1");
        reg.started("alice", &id).unwrap();
        reg.complete("alice", &id, json!({"ok": true})).unwrap();
        let op = reg.get("alice", &id).unwrap();
        assert_eq!(op.status, OperationStatus::Completed);
        assert_eq!(op.result, Some(json!({"ok": true})));
    }

    #[test]
    fn progress_on_unknown_operation_errors() {
        let reg = registry();
        assert!(reg.progress("alice", "does-not-exist", 50, "halfway").is_err());
    }
}
