//! Remediation service: thin CRUD over error-signature-to-fix records
//! (spec §3 "Remediation", §4.8 "Checkpoint & remediation services").

use std::sync::Arc;

use contextd_domain::entities::{MemoryKind, Remediation};
use contextd_domain::error::{Error, Result};
use contextd_domain::ports::{EmbeddingProvider, VectorStoreProvider};

use crate::scope::collection_name_for;

/// One remediation search hit.
#[derive(Debug, Clone, serde::Serialize)]
pub struct RemediationSearchHit {
    /// The matching remediation.
    pub remediation: Remediation,
    /// Raw cosine similarity.
    pub score: f32,
}

/// Stateless orchestration over remediation documents.
pub struct RemediationService {
    vector_store: Arc<dyn VectorStoreProvider>,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl RemediationService {
    /// Build a remediation service over the given vector store and embedder.
    #[must_use]
    pub fn new(vector_store: Arc<dyn VectorStoreProvider>, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self { vector_store, embedder }
    }

    fn collection(&self, owner_id: &str, project_id: &str, branch: &str) -> String {
        collection_name_for(owner_id, project_id, branch, MemoryKind::Remediation)
    }

    /// Record a new remediation (spec §6 `remediation_record`).
    pub async fn record(
        &self,
        owner_id: &str,
        project_id: &str,
        branch: &str,
        error_msg: impl Into<String>,
        solution: impl Into<String>,
        context: Option<String>,
        project_path: impl Into<String>,
    ) -> Result<String> {
        let collection = self.collection(owner_id, project_id, branch);
        let error_msg = error_msg.into();
        let remediation = Remediation::new(error_msg.clone(), solution, context, project_path);
        let embedding = self.embed_one(&error_msg).await?;
        if !self.vector_store.collection_exists(&collection).await? {
            self.vector_store.create_collection(&collection, embedding.len()).await?;
        }
        let document = remediation.to_document(embedding);
        self.vector_store.upsert(&collection, vec![document]).await?;
        Ok(remediation.header.id)
    }

    /// Semantic search by error message (spec §6 `remediation_search`).
    pub async fn search(&self, owner_id: &str, project_id: &str, branch: &str, error_msg: &str, limit: usize) -> Result<Vec<RemediationSearchHit>> {
        let collection = self.collection(owner_id, project_id, branch);
        let query_vector = self.embed_one(error_msg).await?;
        let hits = self.vector_store.search(&collection, &query_vector, limit, None).await?;
        hits.into_iter()
            .map(|hit| Ok(RemediationSearchHit { remediation: Remediation::from_document(&hit.document)?, score: hit.score }))
            .collect()
    }

    /// Apply a `+1`/`-1` feedback delta (spec §6 `remediation_feedback`),
    /// same clamped-confidence semantics as memory feedback.
    pub async fn feedback(&self, owner_id: &str, project_id: &str, branch: &str, remediation_id: &str, delta: f32) -> Result<()> {
        let collection = self.collection(owner_id, project_id, branch);
        let docs = self.vector_store.get(&collection, std::slice::from_ref(&remediation_id.to_owned())).await?;
        let doc = docs.into_iter().next().ok_or_else(|| Error::not_found(format!("remediation {remediation_id}")))?;
        let vector = doc.vector.clone();
        let mut remediation = Remediation::from_document(&doc)?;
        remediation.header.apply_feedback(delta);
        self.vector_store.upsert(&collection, vec![remediation.to_document(vector)]).await
    }

    async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        let mut embeddings = self.embedder.embed(std::slice::from_ref(&text.to_owned())).await?;
        embeddings.pop().map(|e| e.vector).ok_or_else(|| Error::embedding("embedder returned no vectors for a single input"))
    }
}
