//! Vector store abstraction (spec §4.2).
//!
//! Grounded on `mcb-domain/src/ports/providers/vector_store/provider.rs`,
//! collapsed to a single trait since contextd's two backends (embedded,
//! external RPC) share one admin/search/CRUD surface rather than the
//! teacher's admin/browser/provider split.

use async_trait::async_trait;

use crate::entities::Document;
use crate::error::Result;

/// `{name, vectorSize, pointCount}` snapshot of a collection (spec §4.2
/// `GetCollectionInfo`).
#[derive(Debug, Clone)]
pub struct CollectionInfo {
    /// Collection name.
    pub name: String,
    /// Configured embedding dimension.
    pub vector_size: usize,
    /// Number of documents currently stored.
    pub point_count: usize,
}

/// A single top-k search result: a document plus its similarity score.
#[derive(Debug, Clone)]
pub struct SearchHit {
    /// The matching document.
    pub document: Document,
    /// Cosine similarity score (post any service-level boosting is applied
    /// by the caller, not by the store).
    pub score: f32,
}

/// The backend-agnostic vector store contract (spec §4.2 table).
///
/// Both the embedded and external-RPC backends implement this trait;
/// services in `contextd-application` depend only on it.
#[async_trait]
pub trait VectorStoreProvider: Send + Sync {
    /// Create a collection with the given fixed embedding dimension.
    ///
    /// `vector_size == 0` means "use the store's configured default" — the
    /// implementation MUST substitute its default rather than refusing or
    /// creating a zero-dimension collection (spec §4.2).
    async fn create_collection(&self, name: &str, vector_size: usize) -> Result<()>;

    /// Delete a collection and all its documents.
    async fn delete_collection(&self, name: &str) -> Result<()>;

    /// Whether a collection with this name exists.
    async fn collection_exists(&self, name: &str) -> Result<bool>;

    /// List every collection name known to this backend.
    async fn list_collections(&self) -> Result<Vec<String>>;

    /// Fetch `{name, vectorSize, pointCount}` for a collection.
    async fn get_collection_info(&self, name: &str) -> Result<CollectionInfo>;

    /// Insert or replace documents by ID.
    async fn upsert(&self, collection: &str, points: Vec<Document>) -> Result<()>;

    /// Cosine-similarity top-k search. `filter`, if present, is an
    /// implementation-defined predicate string over document payloads.
    async fn search(
        &self,
        collection: &str,
        query_vector: &[f32],
        limit: usize,
        filter: Option<&str>,
    ) -> Result<Vec<SearchHit>>;

    /// Fetch documents by ID.
    async fn get(&self, collection: &str, ids: &[String]) -> Result<Vec<Document>>;

    /// Delete documents by ID.
    async fn delete(&self, collection: &str, ids: &[String]) -> Result<()>;

    /// Backend health check.
    async fn health(&self) -> Result<()>;
}
