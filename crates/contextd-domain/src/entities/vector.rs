//! Backend-agnostic vector collection and document shapes (spec §3).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A document ("point") stored in a vector collection (spec §3
/// "Document / Point").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// UUID string.
    pub id: String,
    /// Embedding vector; length MUST equal the owning collection's
    /// `vector_size`.
    pub vector: Vec<f32>,
    /// Opaque string→value payload; type-tagged by the writing service.
    pub payload: HashMap<String, Value>,
}

/// A backend-agnostic vector collection (spec §3 "Vector collection").
///
/// Invariants: all embeddings share `vector_size`; document IDs are unique
/// within the collection; `name` is immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorCollection {
    /// Collection name (spec §4.1 three-part form).
    pub name: String,
    /// Fixed embedding dimension for every document in this collection.
    pub vector_size: usize,
    /// Document ID → document.
    pub documents: HashMap<String, Document>,
}

impl VectorCollection {
    /// Create an empty collection with the given name and dimension.
    #[must_use]
    pub fn new(name: impl Into<String>, vector_size: usize) -> Self {
        Self {
            name: name.into(),
            vector_size,
            documents: HashMap::new(),
        }
    }

    /// Number of documents currently stored.
    #[must_use]
    pub fn point_count(&self) -> usize {
        self.documents.len()
    }
}
