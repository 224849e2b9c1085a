//! The embedding model collaborator (spec §1 non-goals, §6).
//!
//! The embedding model itself is explicitly out of scope; this is its
//! interface as consumed by the memory/checkpoint/remediation/distiller
//! services.

use async_trait::async_trait;

use crate::error::Result;

/// A single embedding vector, tagged with the dimension it was produced at.
#[derive(Debug, Clone)]
pub struct Embedding {
    /// The embedding values.
    pub vector: Vec<f32>,
}

/// `Embedder.Embed(texts) -> [vec<f32>]`, `Embedder.Dim() -> int` (spec §6).
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a batch of texts, one embedding per input, in order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Embedding>>;

    /// The fixed dimension every embedding this provider returns has.
    fn dim(&self) -> usize;
}
