//! Memory service: CRUD over memory records plus the consolidation-aware
//! search (spec §4.8). Grounded on `mcb-application::use_cases::memory_service`
//! for the "embed, candidate-fetch-then-rescore, write back" shape, replacing
//! its FTS+vector RRF hybrid with the single boosted vector search the spec
//! calls for.

use std::sync::Arc;

use contextd_domain::entities::{MemoryKind, MemoryRecord};
use contextd_domain::error::{Error, Result};
use contextd_domain::identity::CollectionName;
use contextd_domain::ports::{EmbeddingProvider, VectorStoreProvider};

use crate::scope::collection_name_for;

/// One ranked search hit: the record plus its boosted similarity score.
#[derive(Debug, Clone, serde::Serialize)]
pub struct MemorySearchHit {
    /// The matching memory.
    pub record: MemoryRecord,
    /// Cosine similarity after the consolidation boost (spec §4.8 step 4).
    pub score: f32,
}

/// Consolidation ranking boost applied to consolidated memories (spec §4.8
/// step 4, "a +20% ranking boost").
const CONSOLIDATION_BOOST: f32 = contextd_domain::constants::CONSOLIDATION_BOOST;

/// How many extra candidates to fetch to accommodate the archive filter and
/// the rescore (spec §4.8 step 2).
const CANDIDATE_MULTIPLIER: usize = contextd_domain::constants::SEARCH_CANDIDATE_MULTIPLIER;

/// Stateless orchestration over memory documents: the service itself holds
/// no persistent state (spec §3 "Ownership summary") — only `Arc` handles to
/// the ports it composes.
pub struct MemoryService {
    vector_store: Arc<dyn VectorStoreProvider>,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl MemoryService {
    /// Build a memory service over the given vector store and embedder.
    #[must_use]
    pub fn new(vector_store: Arc<dyn VectorStoreProvider>, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self { vector_store, embedder }
    }

    fn collection(&self, owner_id: &str, project_id: &str, branch: &str) -> String {
        collection_name_for(owner_id, project_id, branch, MemoryKind::Memory)
    }

    /// Record a new Active memory (spec §4.8 "Record").
    pub async fn record(
        &self,
        owner_id: &str,
        project_id: &str,
        branch: &str,
        content: impl Into<String>,
        description: impl Into<String>,
        project_path: impl Into<String>,
    ) -> Result<String> {
        let collection = self.collection(owner_id, project_id, branch);
        let record = MemoryRecord::new(content, description, project_path);
        let embedding = self.embed_one(&record.content).await?;
        self.ensure_collection(&collection, embedding.len()).await?;
        let document = record.to_document(embedding);
        self.vector_store.upsert(&collection, vec![document]).await?;
        Ok(record.header.id)
    }

    /// Boosted, archive-filtered semantic search (spec §4.8 "Search").
    pub async fn search(
        &self,
        owner_id: &str,
        project_id: &str,
        branch: &str,
        query: &str,
        limit: usize,
    ) -> Result<Vec<MemorySearchHit>> {
        let collection = self.collection(owner_id, project_id, branch);
        let query_vector = self.embed_one(query).await?;
        let candidate_limit = limit * CANDIDATE_MULTIPLIER;
        let hits = self
            .vector_store
            .search(&collection, &query_vector, candidate_limit, None)
            .await?;

        let mut ranked: Vec<(MemoryRecord, f32)> = Vec::with_capacity(hits.len());
        for hit in hits {
            let record = MemoryRecord::from_document(&hit.document)?;
            if !matches!(record.header.state, contextd_domain::entities::MemoryState::Active) {
                continue;
            }
            let score = if record.header.is_consolidated() {
                hit.score * CONSOLIDATION_BOOST
            } else {
                hit.score
            };
            ranked.push((record, score));
        }
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        ranked.truncate(limit);

        let mut touched = Vec::with_capacity(ranked.len());
        for (mut record, score) in ranked {
            record.header.usage_count += 1;
            record.header.updated_at = chrono::Utc::now();
            touched.push(MemorySearchHit { record, score });
        }
        self.persist_usage_bumps(&collection, &touched).await?;
        Ok(touched)
    }

    async fn persist_usage_bumps(&self, collection: &str, hits: &[MemorySearchHit]) -> Result<()> {
        if hits.is_empty() {
            return Ok(());
        }
        let ids: Vec<String> = hits.iter().map(|h| h.record.header.id.clone()).collect();
        let existing = self.vector_store.get(collection, &ids).await?;
        let mut vectors = std::collections::HashMap::with_capacity(existing.len());
        for doc in existing {
            vectors.insert(doc.id.clone(), doc.vector);
        }
        let mut points = Vec::with_capacity(hits.len());
        for hit in hits {
            let vector = vectors.remove(&hit.record.header.id).unwrap_or_default();
            points.push(hit.record.to_document(vector));
        }
        self.vector_store.upsert(collection, points).await
    }

    /// Apply a `+1`/`-1` feedback delta to a memory's confidence (spec
    /// §4.8 "Feedback"). Never deletes the record.
    pub async fn feedback(&self, owner_id: &str, project_id: &str, branch: &str, memory_id: &str, delta: f32) -> Result<()> {
        let collection = self.collection(owner_id, project_id, branch);
        self.apply_delta(&collection, memory_id, delta).await
    }

    /// Apply an automatic success/failure outcome signal (spec §6
    /// `memory_outcome`). Uses a smaller magnitude than an explicit human
    /// `feedback` call — see `DESIGN.md`.
    pub async fn outcome(&self, owner_id: &str, project_id: &str, branch: &str, memory_id: &str, success: bool) -> Result<()> {
        let delta = if success {
            contextd_domain::constants::OUTCOME_SUCCESS_DELTA
        } else {
            contextd_domain::constants::OUTCOME_FAILURE_DELTA
        };
        self.feedback(owner_id, project_id, branch, memory_id, delta).await
    }

    async fn apply_delta(&self, collection: &str, memory_id: &str, delta: f32) -> Result<()> {
        let docs = self.vector_store.get(collection, std::slice::from_ref(&memory_id.to_owned())).await?;
        let doc = docs
            .into_iter()
            .next()
            .ok_or_else(|| Error::not_found(format!("memory {memory_id}")))?;
        let vector = doc.vector.clone();
        let mut record = MemoryRecord::from_document(&doc)?;
        record.header.apply_feedback(delta);
        self.vector_store.upsert(collection, vec![record.to_document(vector)]).await
    }

    async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        let mut embeddings = self.embedder.embed(std::slice::from_ref(&text.to_owned())).await?;
        embeddings
            .pop()
            .map(|e| e.vector)
            .ok_or_else(|| Error::embedding("embedder returned no vectors for a single input"))
    }

    async fn ensure_collection(&self, collection: &str, vector_size: usize) -> Result<()> {
        if !self.vector_store.collection_exists(collection).await? {
            self.vector_store.create_collection(collection, vector_size).await?;
        }
        Ok(())
    }
}

/// Re-derive the [`CollectionName`] a memory search scope maps to, for
/// callers (tool handlers) that need to surface it (e.g. in a `collection://`
/// resource URI).
#[must_use]
pub fn memory_collection_name(owner_id: &str, project_id: &str, branch: &str) -> CollectionName {
    CollectionName::new(owner_id, project_id, branch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use contextd_domain::entities::Document;
    use contextd_domain::ports::{CollectionInfo, Embedding, SearchHit};
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct FakeEmbedder;

    #[async_trait::async_trait]
    impl EmbeddingProvider for FakeEmbedder {
        async fn embed(&self, texts: &[String]) -> Result<Vec<Embedding>> {
            Ok(texts.iter().map(|_| Embedding { vector: vec![1.0, 0.0] }).collect())
        }
        fn dim(&self) -> usize {
            2
        }
    }

    #[derive(Default)]
    struct FakeStore {
        docs: Mutex<HashMap<String, HashMap<String, Document>>>,
    }

    #[async_trait::async_trait]
    impl VectorStoreProvider for FakeStore {
        async fn create_collection(&self, name: &str, _vector_size: usize) -> Result<()> {
            self.docs.lock().unwrap().entry(name.to_owned()).or_default();
            Ok(())
        }
        async fn delete_collection(&self, name: &str) -> Result<()> {
            self.docs.lock().unwrap().remove(name);
            Ok(())
        }
        async fn collection_exists(&self, name: &str) -> Result<bool> {
            Ok(self.docs.lock().unwrap().contains_key(name))
        }
        async fn list_collections(&self) -> Result<Vec<String>> {
            Ok(self.docs.lock().unwrap().keys().cloned().collect())
        }
        async fn get_collection_info(&self, name: &str) -> Result<CollectionInfo> {
            let docs = self.docs.lock().unwrap();
            let coll = docs.get(name).ok_or_else(|| Error::not_found(name))?;
            Ok(CollectionInfo { name: name.to_owned(), vector_size: 2, point_count: coll.len() })
        }
        async fn upsert(&self, collection: &str, points: Vec<Document>) -> Result<()> {
            let mut docs = self.docs.lock().unwrap();
            let coll = docs.entry(collection.to_owned()).or_default();
            for point in points {
                coll.insert(point.id.clone(), point);
            }
            Ok(())
        }
        async fn search(&self, collection: &str, _query_vector: &[f32], limit: usize, _filter: Option<&str>) -> Result<Vec<SearchHit>> {
            let docs = self.docs.lock().unwrap();
            let Some(coll) = docs.get(collection) else { return Ok(Vec::new()) };
            let mut hits: Vec<SearchHit> = coll.values().cloned().map(|document| SearchHit { document, score: 0.5 }).collect();
            hits.truncate(limit);
            Ok(hits)
        }
        async fn get(&self, collection: &str, ids: &[String]) -> Result<Vec<Document>> {
            let docs = self.docs.lock().unwrap();
            let Some(coll) = docs.get(collection) else { return Ok(Vec::new()) };
            Ok(ids.iter().filter_map(|id| coll.get(id).cloned()).collect())
        }
        async fn delete(&self, collection: &str, ids: &[String]) -> Result<()> {
            if let Some(coll) = self.docs.lock().unwrap().get_mut(collection) {
                for id in ids {
                    coll.remove(id);
                }
            }
            Ok(())
        }
        async fn health(&self) -> Result<()> {
            Ok(())
        }
    }

    fn service() -> MemoryService {
        MemoryService::new(Arc::new(FakeStore::default()), Arc::new(FakeEmbedder))
    }

    #[tokio::test]
    async fn record_then_search_returns_it_with_usage_bumped() {
        let svc = service();
        let id = svc.record("o", "p", "main", "lesson", "desc", "/tmp/p").await.unwrap();
        let hits = svc.search("o", "p", "main", "lesson", 10).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].record.header.id, id);
        assert_eq!(hits[0].record.header.usage_count, 1);
    }

    #[tokio::test]
    async fn search_filters_out_archived_memories() {
        let svc = service();
        let id = svc.record("o", "p", "main", "lesson", "desc", "/tmp/p").await.unwrap();
        // Archive it directly through the store to simulate distiller action.
        let collection = svc.collection("o", "p", "main");
        let docs = svc.vector_store.get(&collection, &[id.clone()]).await.unwrap();
        let mut record = MemoryRecord::from_document(&docs[0]).unwrap();
        record.header.archive_into("consolidated-1");
        svc.vector_store.upsert(&collection, vec![record.to_document(docs[0].vector.clone())]).await.unwrap();

        let hits = svc.search("o", "p", "main", "lesson", 10).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn feedback_clamps_and_never_deletes() {
        let svc = service();
        let id = svc.record("o", "p", "main", "lesson", "desc", "/tmp/p").await.unwrap();
        for _ in 0..10 {
            svc.feedback("o", "p", "main", &id, -1.0).await.unwrap();
        }
        let collection = svc.collection("o", "p", "main");
        let docs = svc.vector_store.get(&collection, &[id.clone()]).await.unwrap();
        assert_eq!(docs.len(), 1);
        let record = MemoryRecord::from_document(&docs[0]).unwrap();
        assert_eq!(record.header.confidence, 0.0);
    }

    #[tokio::test]
    async fn outcome_success_nudges_confidence_up() {
        let svc = service();
        let id = svc.record("o", "p", "main", "lesson", "desc", "/tmp/p").await.unwrap();
        svc.outcome("o", "p", "main", &id, true).await.unwrap();
        let collection = svc.collection("o", "p", "main");
        let docs = svc.vector_store.get(&collection, &[id]).await.unwrap();
        let record = MemoryRecord::from_document(&docs[0]).unwrap();
        assert!(record.header.confidence > contextd_domain::constants::DEFAULT_MEMORY_CONFIDENCE);
    }
}
