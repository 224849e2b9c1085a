//! Repository indexing and search (spec §6 `repository_index` /
//! `repository_search`). The tool catalogue requires this surface but the
//! spec's component budget (§2) scopes it out of the detailed distiller/
//! memory design, so this is deliberately thin: one embedding per file,
//! no AST-aware chunking.
//!
//! Grounded on `mcb-application::use_cases::indexing_service`'s use of
//! `ignore::WalkBuilder` for ignore-pattern-respecting directory walks,
//! and on its `SKIP_DIRS` convention (here in `crate::constants`).

use std::path::Path;
use std::sync::Arc;

use ignore::WalkBuilder;
use serde_json::json;

use contextd_domain::entities::Document;
use contextd_domain::error::Result;
use contextd_domain::identity::CollectionName;
use contextd_domain::ports::{EmbeddingProvider, VectorStoreProvider};

use crate::scope::repository_collection_name;

/// Files larger than this are skipped rather than truncated-and-embedded —
/// a truncated embedding of a huge generated file is worse than no
/// embedding at all.
const MAX_FILE_BYTES: u64 = 256 * 1024;

/// Outcome of one `repository_index` run.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct IndexReport {
    /// Files successfully embedded and upserted.
    pub files_indexed: usize,
    /// Files skipped (too large, binary, or unreadable).
    pub files_skipped: usize,
}

/// One repository search hit.
#[derive(Debug, Clone, serde::Serialize)]
pub struct RepositoryHit {
    /// Absolute file path.
    pub path: String,
    /// Matching excerpt (the indexed content).
    pub content: String,
    /// Cosine similarity score.
    pub score: f32,
}

/// Semantic indexing and search over a project's source tree.
pub struct RepositoryService {
    vector_store: Arc<dyn VectorStoreProvider>,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl RepositoryService {
    /// Build a repository service over the given vector store and embedder.
    #[must_use]
    pub fn new(vector_store: Arc<dyn VectorStoreProvider>, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self { vector_store, embedder }
    }

    /// Walk `project_path`, embed every readable text file, and upsert it
    /// into the project's repository collection (spec §6 `repository_index`,
    /// async tool). `force` re-indexes even if the collection already
    /// exists — without it, indexing a collection that already exists is
    /// still additive (upsert replaces by ID, keyed on file path hash), so
    /// `force` here controls whether unchanged files are re-embedded.
    pub async fn index(&self, owner_id: &str, project_id: &str, branch: &str, project_path: &str, force: bool) -> Result<IndexReport> {
        let collection = repository_collection_name(owner_id, project_id, branch);
        let mut report = IndexReport::default();

        let walker = WalkBuilder::new(project_path)
            .filter_entry(|entry| !crate::constants::SKIP_DIRS.iter().any(|skip| entry.path().components().any(|c| c.as_os_str() == *skip)))
            .build();

        let mut collection_ready = self.vector_store.collection_exists(&collection).await?;

        for entry in walker.filter_map(std::result::Result::ok) {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            match self.index_one(&collection, path, force, &mut collection_ready).await {
                Ok(true) => report.files_indexed += 1,
                Ok(false) => report.files_skipped += 1,
                Err(err) => {
                    tracing::warn!(error = %err, path = %path.display(), "repository_index: failed to index file, continuing");
                    report.files_skipped += 1;
                }
            }
        }
        Ok(report)
    }

    async fn index_one(&self, collection: &str, path: &Path, force: bool, collection_ready: &mut bool) -> Result<bool> {
        let metadata = std::fs::metadata(path)?;
        if metadata.len() > MAX_FILE_BYTES {
            return Ok(false);
        }
        let Ok(content) = std::fs::read_to_string(path) else {
            return Ok(false); // not valid UTF-8 text; treat as binary
        };
        let doc_id = uuid::Uuid::new_v5(&uuid::Uuid::NAMESPACE_URL, path.to_string_lossy().as_bytes()).to_string();

        if !force {
            let existing = self.vector_store.get(collection, std::slice::from_ref(&doc_id)).await.unwrap_or_default();
            if !existing.is_empty() {
                return Ok(false);
            }
        }

        let embedding = self.embed_one(&content).await?;
        if !*collection_ready {
            self.vector_store.create_collection(collection, embedding.len()).await?;
            *collection_ready = true;
        }
        let payload = [
            ("path".to_owned(), json!(path.to_string_lossy())),
            ("content".to_owned(), json!(content)),
        ]
        .into_iter()
        .collect();
        self.vector_store.upsert(collection, vec![Document { id: doc_id, vector: embedding, payload }]).await?;
        Ok(true)
    }

    /// Semantic search over an indexed project (spec §6 `repository_search`).
    pub async fn search(&self, owner_id: &str, project_id: &str, branch: &str, query: &str, limit: usize) -> Result<Vec<RepositoryHit>> {
        let collection = repository_collection_name(owner_id, project_id, branch);
        let query_vector = self.embed_one(query).await?;
        let hits = self.vector_store.search(&collection, &query_vector, limit, None).await?;
        Ok(hits
            .into_iter()
            .map(|hit| RepositoryHit {
                path: hit.document.payload.get("path").and_then(|v| v.as_str()).unwrap_or_default().to_owned(),
                content: hit.document.payload.get("content").and_then(|v| v.as_str()).unwrap_or_default().to_owned(),
                score: hit.score,
            })
            .collect())
    }

    async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        let mut embeddings = self.embedder.embed(std::slice::from_ref(&text.to_owned())).await?;
        embeddings
            .pop()
            .map(|e| e.vector)
            .ok_or_else(|| contextd_domain::error::Error::embedding("embedder returned no vectors for a single input"))
    }
}

/// Re-derive the [`CollectionName`] a repository index scope maps to.
#[must_use]
pub fn repository_scope_name(owner_id: &str, project_id: &str, branch: &str) -> CollectionName {
    CollectionName::new(owner_id, project_id, &format!("{branch}__repository"))
}
