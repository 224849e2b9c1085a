//! In-process operation event bus (spec §4.4: `operations.<ownerID>.<opID>.<event>`
//! pub/sub subjects, at-least-once delivery, no persistence beyond attached
//! subscribers).
//!
//! Grounded on `mcb-infrastructure::events::broadcast::BroadcastEventBus`'s
//! `tokio::sync::broadcast` + `futures::stream::unfold` shape, without the
//! teacher's `linkme` plugin-registration layer (contextd has exactly one
//! bus implementation, wired directly, not a runtime-discovered provider
//! set) and without NATS (see `DESIGN.md`: no multi-process fan-out to
//! justify an external broker for a per-developer daemon).

use chrono::{DateTime, Utc};
use futures::stream::{self, Stream};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;

const EVENT_BUS_BUFFER_SIZE: usize = 1024;

/// One of the five event kinds an operation can emit (spec §4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationEventKind {
    /// `Started` transitioned pending→running.
    Started,
    /// `Progress(percent, msg)`.
    Progress,
    /// `Log(level, msg)`.
    Log,
    /// Terminal: `Error(code, err)`.
    Error,
    /// Terminal: `Complete(result)`.
    Completed,
}

/// One event published on an operation's subject
/// (`operations.<ownerID>.<opID>.<event>`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationEvent {
    /// Owning operation ID.
    pub operation_id: String,
    /// Authenticated owner the operation belongs to.
    pub owner_id: String,
    /// Which event this is.
    pub kind: OperationEventKind,
    /// Event-specific payload (progress percent/msg, log line, error
    /// code/message, or the completed result).
    pub payload: Value,
    /// Wall-clock time the event was published.
    pub timestamp: DateTime<Utc>,
}

/// In-process publish/subscribe bus for operation events.
///
/// A single global bus carries every operation's events; subscribers
/// (the SSE handler) filter by `operation_id` themselves, mirroring how
/// the teacher's `DomainEvent` bus is one broadcast channel with
/// per-subscriber filtering rather than one channel per subject.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<OperationEvent>,
}

impl EventBus {
    /// Create a new bus with the default buffer size.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_BUS_BUFFER_SIZE);
        Self { sender }
    }

    /// Publish an event. Delivery is at-least-once to currently-attached
    /// subscribers only; a send with no subscribers is not an error.
    pub fn publish(&self, event: OperationEvent) {
        let _ = self.sender.send(event);
    }

    /// Subscribe to every event on the bus, as a stream. Callers filter by
    /// `operation_id` for the subject they care about. Lagged subscribers
    /// skip missed events rather than terminating.
    pub fn subscribe(&self) -> impl Stream<Item = OperationEvent> + Send {
        let receiver = self.sender.subscribe();
        stream::unfold(receiver, |mut rx| async move {
            loop {
                match rx.recv().await {
                    Ok(event) => return Some((event, rx)),
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(skipped = n, "event bus subscriber lagged, skipping events");
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => return None,
                }
            }
        })
    }

    /// Subscribe filtered to a single operation's events.
    pub fn subscribe_operation(&self, operation_id: String) -> impl Stream<Item = OperationEvent> + Send {
        use futures::StreamExt;
        self.subscribe().filter(move |event| {
            let matches = event.operation_id == operation_id;
            async move { matches }
        })
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    fn sample_event(operation_id: &str, kind: OperationEventKind) -> OperationEvent {
        OperationEvent {
            operation_id: operation_id.to_owned(),
            owner_id: "owner".to_owned(),
            kind,
            payload: Value::Null,
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn subscriber_receives_published_event() {
        let bus = EventBus::new();
        let mut stream = Box::pin(bus.subscribe());
        bus.publish(sample_event("op-1", OperationEventKind::Started));
        let event = stream.next().await.unwrap();
        assert_eq!(event.operation_id, "op-1");
        assert_eq!(event.kind, OperationEventKind::Started);
    }

    #[tokio::test]
    async fn subscribe_operation_filters_out_other_operations() {
        let bus = EventBus::new();
        let mut stream = Box::pin(bus.subscribe_operation("op-1".to_owned()));
        bus.publish(sample_event("op-2", OperationEventKind::Started));
        bus.publish(sample_event("op-1", OperationEventKind::Completed));
        let event = stream.next().await.unwrap();
        assert_eq!(event.operation_id, "op-1");
        assert_eq!(event.kind, OperationEventKind::Completed);
    }

    #[tokio::test]
    async fn publish_with_no_subscribers_does_not_panic() {
        let bus = EventBus::new();
        bus.publish(sample_event("op-1", OperationEventKind::Started));
    }
}
