//! Default local embedder (spec §3: "typical 384 for the default local
//! embedder"). The embedding model itself is an explicit non-goal; this is
//! a deterministic, dependency-free stand-in so the daemon has something
//! to embed with out of the box, not a real semantic model.
//!
//! Grounded on the hashing-trick bag-of-features approach: tokenize on
//! whitespace/punctuation, hash each token into one of `dim` buckets,
//! accumulate sign, L2-normalize. No teacher analog (the teacher always
//! calls a real provider); this exists only because contextd's services
//! need *a* concrete [`EmbeddingProvider`] to run against without network
//! access.

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use contextd_domain::constants::DEFAULT_VECTOR_DIMENSION;
use contextd_domain::error::Result;
use contextd_domain::ports::{Embedding, EmbeddingProvider};

/// Deterministic hashing-trick embedder. Same input text always produces
/// the same vector; unrelated texts are not guaranteed to be semantically
/// close, only stable and collision-resistant enough for tests and a
/// dependency-free default.
pub struct LocalEmbedder {
    dim: usize,
}

impl LocalEmbedder {
    /// Build an embedder producing vectors of `dim` dimensions.
    #[must_use]
    pub fn new(dim: usize) -> Self {
        Self { dim: if dim == 0 { DEFAULT_VECTOR_DIMENSION } else { dim } }
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut buckets = vec![0.0f32; self.dim];
        for token in text.split(|c: char| !c.is_alphanumeric()).filter(|t| !t.is_empty()) {
            let mut hasher = Sha256::new();
            hasher.update(token.as_bytes());
            let digest = hasher.finalize();
            let bucket = u32::from_le_bytes([digest[0], digest[1], digest[2], digest[3]]) as usize % self.dim;
            let sign = if digest[4] % 2 == 0 { 1.0 } else { -1.0 };
            buckets[bucket] += sign;
        }
        let magnitude = buckets.iter().map(|v| v * v).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for v in &mut buckets {
                *v /= magnitude;
            }
        }
        buckets
    }
}

impl Default for LocalEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_VECTOR_DIMENSION)
    }
}

#[async_trait]
impl EmbeddingProvider for LocalEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        Ok(texts.iter().map(|text| Embedding { vector: self.embed_one(text) }).collect())
    }

    fn dim(&self) -> usize {
        self.dim
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn same_text_always_embeds_identically() {
        let embedder = LocalEmbedder::new(64);
        let a = embedder.embed(&["hello world".to_owned()]).await.unwrap();
        let b = embedder.embed(&["hello world".to_owned()]).await.unwrap();
        assert_eq!(a[0].vector, b[0].vector);
    }

    #[tokio::test]
    async fn vector_has_requested_dimension() {
        let embedder = LocalEmbedder::new(128);
        let result = embedder.embed(&["anything".to_owned()]).await.unwrap();
        assert_eq!(result[0].vector.len(), 128);
        assert_eq!(embedder.dim(), 128);
    }

    #[tokio::test]
    async fn empty_text_produces_zero_vector() {
        let embedder = LocalEmbedder::new(32);
        let result = embedder.embed(&[String::new()]).await.unwrap();
        assert!(result[0].vector.iter().all(|&v| v == 0.0));
    }

    #[tokio::test]
    async fn zero_dim_substitutes_default() {
        let embedder = LocalEmbedder::new(0);
        assert_eq!(embedder.dim(), DEFAULT_VECTOR_DIMENSION);
    }
}
