//! Checkpoint service: thin CRUD over checkpoint-shaped records (spec §3
//! "Checkpoint", §4.8 "Checkpoint & remediation services"). Same record
//! lifecycle as [`crate::memory_service::MemoryService`] but no
//! consolidation boost — checkpoints are never consolidated.

use std::sync::Arc;

use contextd_domain::entities::{Checkpoint, MemoryKind, MemoryState};
use contextd_domain::error::{Error, Result};
use contextd_domain::ports::{EmbeddingProvider, VectorStoreProvider};

use crate::scope::collection_name_for;

/// One checkpoint search hit.
#[derive(Debug, Clone, serde::Serialize)]
pub struct CheckpointSearchHit {
    /// The matching checkpoint.
    pub checkpoint: Checkpoint,
    /// Raw cosine similarity (no boosting — checkpoints are not
    /// consolidation targets).
    pub score: f32,
}

/// Stateless orchestration over checkpoint documents.
pub struct CheckpointService {
    vector_store: Arc<dyn VectorStoreProvider>,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl CheckpointService {
    /// Build a checkpoint service over the given vector store and embedder.
    #[must_use]
    pub fn new(vector_store: Arc<dyn VectorStoreProvider>, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self { vector_store, embedder }
    }

    fn collection(&self, owner_id: &str, project_id: &str, branch: &str) -> String {
        collection_name_for(owner_id, project_id, branch, MemoryKind::Checkpoint)
    }

    /// Save a new checkpoint (spec §6 `checkpoint_save`, async tool).
    pub async fn save(
        &self,
        owner_id: &str,
        project_id: &str,
        branch: &str,
        content: impl Into<String>,
        summary: impl Into<String>,
        tags: Vec<String>,
        project_path: impl Into<String>,
    ) -> Result<String> {
        let collection = self.collection(owner_id, project_id, branch);
        let checkpoint = Checkpoint::new(content, summary, tags, project_path);
        let embedding = self.embed_one(&checkpoint.content).await?;
        if !self.vector_store.collection_exists(&collection).await? {
            self.vector_store.create_collection(&collection, embedding.len()).await?;
        }
        let document = checkpoint.to_document(embedding);
        self.vector_store.upsert(&collection, vec![document]).await?;
        Ok(checkpoint.header.id)
    }

    /// Semantic search over checkpoints (spec §6 `checkpoint_search`).
    pub async fn search(&self, owner_id: &str, project_id: &str, branch: &str, query: &str, limit: usize) -> Result<Vec<CheckpointSearchHit>> {
        let collection = self.collection(owner_id, project_id, branch);
        let query_vector = self.embed_one(query).await?;
        let hits = self.vector_store.search(&collection, &query_vector, limit, None).await?;
        hits.into_iter()
            .map(|hit| Ok(CheckpointSearchHit { checkpoint: Checkpoint::from_document(&hit.document)?, score: hit.score }))
            .collect()
    }

    /// List checkpoints in chronological order (spec §6 `checkpoint_list`).
    /// The embedded store has no native ordering, so listing fetches every
    /// document and sorts by `created_at` descending, newest first.
    pub async fn list(&self, owner_id: &str, project_id: &str, branch: &str, limit: usize) -> Result<Vec<Checkpoint>> {
        let collection = self.collection(owner_id, project_id, branch);
        if !self.vector_store.collection_exists(&collection).await? {
            return Ok(Vec::new());
        }
        let info = self.vector_store.get_collection_info(&collection).await?;
        // A zero vector matches nothing meaningfully, but search with a
        // generous limit is the only enumeration primitive the store
        // contract exposes; point_count bounds how many to ask for.
        let zero_vector = vec![0.0_f32; info.vector_size];
        let hits = self.vector_store.search(&collection, &zero_vector, info.point_count, None).await?;
        let mut checkpoints: Vec<Checkpoint> = hits
            .into_iter()
            .filter_map(|hit| Checkpoint::from_document(&hit.document).ok())
            .filter(|checkpoint| matches!(checkpoint.header.state, MemoryState::Active))
            .collect();
        checkpoints.sort_by(|a, b| b.header.created_at.cmp(&a.header.created_at));
        checkpoints.truncate(limit);
        Ok(checkpoints)
    }

    /// Resume (fetch by ID) a single checkpoint (spec §6 `checkpoint_resume`).
    pub async fn resume(&self, owner_id: &str, project_id: &str, branch: &str, checkpoint_id: &str) -> Result<Checkpoint> {
        let collection = self.collection(owner_id, project_id, branch);
        let docs = self.vector_store.get(&collection, std::slice::from_ref(&checkpoint_id.to_owned())).await?;
        let doc = docs.into_iter().next().ok_or_else(|| Error::not_found(format!("checkpoint {checkpoint_id}")))?;
        Checkpoint::from_document(&doc)
    }

    async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        let mut embeddings = self.embedder.embed(std::slice::from_ref(&text.to_owned())).await?;
        embeddings.pop().map(|e| e.vector).ok_or_else(|| Error::embedding("embedder returned no vectors for a single input"))
    }
}
