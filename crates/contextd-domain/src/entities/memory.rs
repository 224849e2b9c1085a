//! Memory, checkpoint and remediation records (spec §3).
//!
//! All three share the same lifecycle shape — a closed Active/Archived sum
//! type, a clamped confidence score, and consolidation back-links — but
//! carry type-specific payload fields. Grounded on the
//! `mcb-domain/src/entities/memory/observation.rs` shape: a `kind` enum
//! plus a payload struct, rather than one god-struct with optional fields.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::constants::DEFAULT_MEMORY_CONFIDENCE;
use crate::entities::vector::Document;
use crate::error::Result;

/// Serialize `value` into a [`Document`] payload keyed by its own JSON field
/// names, so a record round-trips through the vector store without a
/// hand-maintained field list.
fn to_document<T: Serialize>(value: &T, id: &str, vector: Vec<f32>) -> Document {
    let payload = match serde_json::to_value(value) {
        Ok(Value::Object(map)) => map.into_iter().collect(),
        _ => std::collections::HashMap::new(),
    };
    Document { id: id.to_owned(), vector, payload }
}

/// Inverse of [`to_document`]: rebuild a record from a fetched document's
/// payload.
fn from_document<T: DeserializeOwned>(doc: &Document) -> Result<T> {
    let value = Value::Object(doc.payload.clone().into_iter().collect());
    Ok(serde_json::from_value(value)?)
}

/// The closed set of states a record can be in (spec §9: "use a closed
/// sum/variant representation rather than a boolean").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryState {
    /// Directly returnable by search.
    Active,
    /// Superseded by a consolidated memory; only reachable via back-link.
    Archived,
}

/// Which record family a given document's payload belongs to. Memories,
/// checkpoints and remediations live in distinct collections but are
/// searched identically (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryKind {
    /// A strategy/lesson memory.
    Memory,
    /// A saved session checkpoint.
    Checkpoint,
    /// An error-signature-to-fix remediation.
    Remediation,
}

/// Fields shared by every record family (spec §3 "Memory record").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordHeader {
    /// Document ID (UUID string).
    pub id: String,
    /// Active or Archived.
    pub state: MemoryState,
    /// Confidence in [0.0, 1.0], always clamped.
    pub confidence: f32,
    /// Incremented on every successful retrieval.
    pub usage_count: u32,
    /// Active ⇒ points at the consolidated memory superseding this one.
    /// Archived ⇒ back-link to the consolidated memory. Invariant:
    /// Archived ⇒ this field is set.
    pub consolidation_id: Option<String>,
    /// Only set on a consolidated memory: the source memory IDs it
    /// replaces. Invariant: consolidated ⇒ non-empty.
    pub archived_memory_ids: Vec<String>,
    /// Absolute path of the project this record belongs to.
    pub project_path: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-modified timestamp.
    pub updated_at: DateTime<Utc>,
}

impl RecordHeader {
    /// Build a freshly recorded header: `state=Active`, default confidence,
    /// `usage_count=0`, no consolidation links.
    #[must_use]
    pub fn new(project_path: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            state: MemoryState::Active,
            confidence: DEFAULT_MEMORY_CONFIDENCE,
            usage_count: 0,
            consolidation_id: None,
            archived_memory_ids: Vec::new(),
            project_path: project_path.into(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether this record is a consolidated memory (non-empty
    /// `archived_memory_ids`).
    #[must_use]
    pub fn is_consolidated(&self) -> bool {
        !self.archived_memory_ids.is_empty()
    }

    /// Apply a `+1`/`-1` feedback delta, clamping confidence to [0, 1].
    /// Never deletes the record; archival is the distiller's job alone
    /// (spec §4.8 "Feedback").
    pub fn apply_feedback(&mut self, delta: f32) {
        self.confidence = (self.confidence + delta).clamp(0.0, 1.0);
        self.updated_at = Utc::now();
    }

    /// Mark this record archived, back-linked to `consolidated_id`.
    pub fn archive_into(&mut self, consolidated_id: &str) {
        self.state = MemoryState::Archived;
        self.consolidation_id = Some(consolidated_id.to_owned());
        self.updated_at = Utc::now();
    }
}

/// A strategy/lesson memory (spec §3 "Memory record").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryRecord {
    /// Shared lifecycle fields.
    pub header: RecordHeader,
    /// Opaque text: the strategy/lesson itself.
    pub content: String,
    /// Short summary. When this memory is a consolidation target, the
    /// description explicitly attributes its sources (spec §4.9 step 6).
    pub description: String,
}

impl MemoryRecord {
    /// Record a new Active memory with `usage_count=0` and default
    /// confidence (spec §4.8 "Record").
    #[must_use]
    pub fn new(content: impl Into<String>, description: impl Into<String>, project_path: impl Into<String>) -> Self {
        Self {
            header: RecordHeader::new(project_path),
            content: content.into(),
            description: description.into(),
        }
    }

    /// Serialize into a vector store [`Document`] keyed by `header.id`.
    #[must_use]
    pub fn to_document(&self, vector: Vec<f32>) -> Document {
        to_document(self, &self.header.id, vector)
    }

    /// Rebuild from a fetched [`Document`].
    pub fn from_document(doc: &Document) -> Result<Self> {
        from_document(doc)
    }
}

/// A saved session checkpoint (spec §3 "Checkpoint").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Shared lifecycle fields.
    pub header: RecordHeader,
    /// Short summary of the checkpoint.
    pub summary: String,
    /// Full saved content.
    pub content: String,
    /// Free-form tags for later filtering.
    pub tags: Vec<String>,
}

impl Checkpoint {
    /// Record a new Active checkpoint.
    #[must_use]
    pub fn new(
        content: impl Into<String>,
        summary: impl Into<String>,
        tags: Vec<String>,
        project_path: impl Into<String>,
    ) -> Self {
        Self {
            header: RecordHeader::new(project_path),
            summary: summary.into(),
            content: content.into(),
            tags,
        }
    }

    /// Serialize into a vector store [`Document`] keyed by `header.id`.
    #[must_use]
    pub fn to_document(&self, vector: Vec<f32>) -> Document {
        to_document(self, &self.header.id, vector)
    }

    /// Rebuild from a fetched [`Document`].
    pub fn from_document(doc: &Document) -> Result<Self> {
        from_document(doc)
    }
}

/// An error-signature-to-fix remediation (spec §3 "Remediation").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Remediation {
    /// Shared lifecycle fields.
    pub header: RecordHeader,
    /// The error message/signature this remediation addresses.
    pub error_msg: String,
    /// The fix that resolved it.
    pub solution: String,
    /// Optional surrounding context (stack trace, command, etc).
    pub context: Option<String>,
}

impl Remediation {
    /// Record a new Active remediation.
    #[must_use]
    pub fn new(
        error_msg: impl Into<String>,
        solution: impl Into<String>,
        context: Option<String>,
        project_path: impl Into<String>,
    ) -> Self {
        Self {
            header: RecordHeader::new(project_path),
            error_msg: error_msg.into(),
            solution: solution.into(),
            context,
        }
    }

    /// Serialize into a vector store [`Document`] keyed by `header.id`.
    #[must_use]
    pub fn to_document(&self, vector: Vec<f32>) -> Document {
        to_document(self, &self.header.id, vector)
    }

    /// Rebuild from a fetched [`Document`].
    pub fn from_document(doc: &Document) -> Result<Self> {
        from_document(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feedback_clamps_to_unit_interval() {
        let mut header = RecordHeader::new("/tmp/p");
        for _ in 0..20 {
            header.apply_feedback(1.0);
        }
        assert!((0.0..=1.0).contains(&header.confidence));
        assert!(header.confidence >= 0.99);
        for _ in 0..20 {
            header.apply_feedback(-1.0);
        }
        assert!((0.0..=1.0).contains(&header.confidence));
        assert!(header.confidence <= 0.01);
    }

    #[test]
    fn archiving_sets_back_link() {
        let mut header = RecordHeader::new("/tmp/p");
        header.archive_into("consolidated-1");
        assert_eq!(header.state, MemoryState::Archived);
        assert_eq!(header.consolidation_id.as_deref(), Some("consolidated-1"));
    }

    #[test]
    fn fresh_record_defaults() {
        let m = MemoryRecord::new("lesson", "desc", "/tmp/p");
        assert_eq!(m.header.state, MemoryState::Active);
        assert_eq!(m.header.usage_count, 0);
        assert!(!m.header.is_consolidated());
    }

    #[test]
    fn document_round_trip_preserves_fields() {
        let original = MemoryRecord::new("lesson", "desc", "/tmp/p");
        let doc = original.to_document(vec![0.1, 0.2, 0.3]);
        assert_eq!(doc.id, original.header.id);
        let restored = MemoryRecord::from_document(&doc).unwrap();
        assert_eq!(restored.header.id, original.header.id);
        assert_eq!(restored.content, original.content);
        assert_eq!(restored.description, original.description);
    }
}
