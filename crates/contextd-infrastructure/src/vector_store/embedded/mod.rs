//! Embedded on-disk vector store (spec §4.3, §6 "On-disk layout").
//!
//! ```text
//! <vectorstore-path>/
//!   <collection-hash>/            # first 8 hex of SHA-256(collectionName)
//!     00000000.gob                # metadata: {name, vector_size}
//!     <doc-hash>.gob              # one file per document
//!   .quarantine/                  # corrupt collection dirs, moved aside
//! ```
//!
//! Grounded on `mcb-infrastructure::storage::file_hash`'s on-disk-state
//! discipline (atomic writes, a dedicated module per storage concern);
//! the directory-per-collection/file-per-document layout and the
//! quarantine-on-corrupt-load behavior have no teacher analog and come
//! straight from spec §4.3.

mod atomic;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;

use contextd_domain::constants::DEFAULT_VECTOR_DIMENSION;
use contextd_domain::entities::Document;
use contextd_domain::error::{Error, Result};
use contextd_domain::ports::{CollectionInfo, SearchHit, VectorStoreProvider};
use contextd_domain::similarity::cosine_similarity;

use atomic::write_atomic;

const METADATA_FILENAME: &str = "00000000.gob";
const QUARANTINE_DIR: &str = ".quarantine";

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct CollectionMetadata {
    name: String,
    vector_size: usize,
}

struct CollectionHandle {
    dir: PathBuf,
    vector_size: usize,
    docs: RwLock<HashMap<String, Document>>,
}

/// `<home>/.config/contextd/vectorstore`, the default embedded-store root.
#[must_use]
pub fn default_root() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("contextd").join("vectorstore"))
}

/// First 8 lowercase-hex characters of SHA-256(`s`) (spec §6).
fn short_hash(s: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(s.as_bytes());
    hex::encode(hasher.finalize())[..8].to_owned()
}

/// The on-disk, single-process embedded vector store.
pub struct EmbeddedVectorStore {
    root: PathBuf,
    collections: DashMap<String, Arc<CollectionHandle>>,
}

impl EmbeddedVectorStore {
    /// Load every collection under `root`, quarantining any whose metadata
    /// is missing or unreadable (spec §4.3 "Loader invariants"). Returns
    /// the opened store plus the names of quarantined collection
    /// directories (their hash, since a corrupt collection's canonical
    /// name can't be recovered from a missing metadata file).
    pub async fn open(root: &Path) -> Result<(Self, Vec<String>)> {
        std::fs::create_dir_all(root)?;
        let store = Self { root: root.to_owned(), collections: DashMap::new() };
        let mut quarantined = Vec::new();

        let entries = std::fs::read_dir(root)?;
        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let dir_name = entry.file_name().to_string_lossy().into_owned();
            if dir_name == QUARANTINE_DIR {
                continue;
            }

            match store.load_collection(&path).await {
                Ok((name, handle)) => {
                    store.collections.insert(name, Arc::new(handle));
                }
                Err(err) => {
                    tracing::warn!(dir = %dir_name, error = %err, "quarantining corrupt collection");
                    store.quarantine(&path, &dir_name)?;
                    quarantined.push(dir_name);
                }
            }
        }

        Ok((store, quarantined))
    }

    async fn load_collection(&self, dir: &Path) -> Result<(String, CollectionHandle)> {
        let metadata_path = dir.join(METADATA_FILENAME);
        let metadata_bytes = std::fs::read(&metadata_path)?;
        let metadata: CollectionMetadata = bincode::deserialize(&metadata_bytes).map_err(|e| Error::vector_store(e.to_string()))?;

        let mut docs = HashMap::new();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.file_name().and_then(|n| n.to_str()) == Some(METADATA_FILENAME) {
                continue;
            }
            match std::fs::read(&path).map_err(Error::from).and_then(|bytes| serde_json::from_slice::<Document>(&bytes).map_err(Error::from)) {
                Ok(doc) => {
                    docs.insert(doc.id.clone(), doc);
                }
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "skipping unreadable document file");
                }
            }
        }

        Ok((metadata.name, CollectionHandle { dir: dir.to_owned(), vector_size: metadata.vector_size, docs: RwLock::new(docs) }))
    }

    fn quarantine(&self, dir: &Path, dir_name: &str) -> Result<()> {
        let quarantine_root = self.root.join(QUARANTINE_DIR);
        std::fs::create_dir_all(&quarantine_root)?;
        std::fs::rename(dir, quarantine_root.join(dir_name))?;
        Ok(())
    }

    /// Reconstruct a lost metadata file for a collection directory whose
    /// documents survive, inferring `vector_size` from the first readable
    /// document (spec §4.3 "Recovery interface"). Errors if the directory
    /// has no document files to infer a dimension from.
    pub fn recover_metadata(root: &Path, collection_name: &str) -> Result<()> {
        let dir = root.join(short_hash(collection_name));
        let vector_size = std::fs::read_dir(&dir)?
            .filter_map(std::result::Result::ok)
            .filter(|entry| entry.file_name().to_string_lossy() != METADATA_FILENAME)
            .find_map(|entry| {
                let bytes = std::fs::read(entry.path()).ok()?;
                let doc: Document = serde_json::from_slice(&bytes).ok()?;
                Some(doc.vector.len())
            })
            .ok_or_else(|| Error::vector_store(format!("no recoverable documents in {}", dir.display())))?;

        let metadata = CollectionMetadata { name: collection_name.to_owned(), vector_size };
        let bytes = bincode::serialize(&metadata).map_err(|e| Error::vector_store(e.to_string()))?;
        write_atomic(&dir.join(METADATA_FILENAME), &bytes)
    }

    fn handle(&self, name: &str) -> Result<Arc<CollectionHandle>> {
        self.collections.get(name).map(|entry| Arc::clone(&entry)).ok_or_else(|| Error::not_found(name))
    }

    fn doc_path(handle: &CollectionHandle, doc_id: &str) -> PathBuf {
        handle.dir.join(format!("{}.gob", short_hash(doc_id)))
    }

    fn matches_filter(doc: &Document, filter: Option<&str>) -> bool {
        let Some(filter) = filter else { return true };
        let Some((key, value)) = filter.split_once('=') else { return true };
        match doc.payload.get(key) {
            Some(serde_json::Value::String(s)) => s == value,
            Some(other) => other.to_string() == value,
            None => false,
        }
    }
}

#[async_trait]
impl VectorStoreProvider for EmbeddedVectorStore {
    async fn create_collection(&self, name: &str, vector_size: usize) -> Result<()> {
        if self.collections.contains_key(name) {
            return Err(Error::already_exists(name));
        }
        let vector_size = if vector_size == 0 { DEFAULT_VECTOR_DIMENSION } else { vector_size };
        let dir = self.root.join(short_hash(name));
        std::fs::create_dir_all(&dir)?;

        let metadata = CollectionMetadata { name: name.to_owned(), vector_size };
        let bytes = bincode::serialize(&metadata).map_err(|e| Error::vector_store(e.to_string()))?;
        write_atomic(&dir.join(METADATA_FILENAME), &bytes)?;

        self.collections.insert(name.to_owned(), Arc::new(CollectionHandle { dir, vector_size, docs: RwLock::new(HashMap::new()) }));
        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        let handle = self.handle(name)?;
        std::fs::remove_dir_all(&handle.dir)?;
        self.collections.remove(name);
        Ok(())
    }

    async fn collection_exists(&self, name: &str) -> Result<bool> {
        Ok(self.collections.contains_key(name))
    }

    async fn list_collections(&self) -> Result<Vec<String>> {
        Ok(self.collections.iter().map(|entry| entry.key().clone()).collect())
    }

    async fn get_collection_info(&self, name: &str) -> Result<CollectionInfo> {
        let handle = self.handle(name)?;
        let point_count = handle.docs.read().await.len();
        Ok(CollectionInfo { name: name.to_owned(), vector_size: handle.vector_size, point_count })
    }

    async fn upsert(&self, collection: &str, points: Vec<Document>) -> Result<()> {
        let handle = self.handle(collection)?;
        for doc in &points {
            if doc.vector.len() != handle.vector_size {
                return Err(Error::DimensionMismatch { expected: handle.vector_size, actual: doc.vector.len() });
            }
        }
        let mut docs = handle.docs.write().await;
        for doc in points {
            let bytes = serde_json::to_vec(&doc)?;
            write_atomic(&Self::doc_path(&handle, &doc.id), &bytes)?;
            docs.insert(doc.id.clone(), doc);
        }
        Ok(())
    }

    async fn search(&self, collection: &str, query_vector: &[f32], limit: usize, filter: Option<&str>) -> Result<Vec<SearchHit>> {
        let handle = self.handle(collection)?;
        let docs = handle.docs.read().await;
        let mut hits: Vec<SearchHit> = docs
            .values()
            .filter(|doc| Self::matches_filter(doc, filter))
            .map(|doc| SearchHit { document: doc.clone(), score: cosine_similarity(query_vector, &doc.vector) })
            .collect();
        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(limit);
        Ok(hits)
    }

    async fn get(&self, collection: &str, ids: &[String]) -> Result<Vec<Document>> {
        let handle = self.handle(collection)?;
        let docs = handle.docs.read().await;
        Ok(ids.iter().filter_map(|id| docs.get(id).cloned()).collect())
    }

    async fn delete(&self, collection: &str, ids: &[String]) -> Result<()> {
        let handle = self.handle(collection)?;
        let mut docs = handle.docs.write().await;
        for id in ids {
            if docs.remove(id).is_some() {
                let _ = std::fs::remove_file(Self::doc_path(&handle, id));
            }
        }
        Ok(())
    }

    async fn health(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap as StdHashMap;

    fn doc(id: &str, vector: Vec<f32>) -> Document {
        Document { id: id.to_owned(), vector, payload: StdHashMap::new() }
    }

    #[tokio::test]
    async fn create_upsert_search_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let (store, quarantined) = EmbeddedVectorStore::open(dir.path()).await.unwrap();
        assert!(quarantined.is_empty());

        store.create_collection("owner_a/project_b/main", 3).await.unwrap();
        store.upsert("owner_a/project_b/main", vec![doc("d1", vec![1.0, 0.0, 0.0]), doc("d2", vec![0.0, 1.0, 0.0])]).await.unwrap();

        let hits = store.search("owner_a/project_b/main", &[1.0, 0.0, 0.0], 10, None).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].document.id, "d1");
    }

    #[tokio::test]
    async fn upsert_rejects_wrong_dimension() {
        let dir = tempfile::tempdir().unwrap();
        let (store, _) = EmbeddedVectorStore::open(dir.path()).await.unwrap();
        store.create_collection("c", 3).await.unwrap();
        let result = store.upsert("c", vec![doc("d1", vec![1.0, 0.0])]).await;
        assert!(matches!(result, Err(Error::DimensionMismatch { expected: 3, actual: 2 })));
    }

    #[tokio::test]
    async fn create_collection_twice_fails() {
        let dir = tempfile::tempdir().unwrap();
        let (store, _) = EmbeddedVectorStore::open(dir.path()).await.unwrap();
        store.create_collection("c", 3).await.unwrap();
        assert!(matches!(store.create_collection("c", 3).await, Err(Error::AlreadyExists { .. })));
    }

    #[tokio::test]
    async fn zero_vector_size_substitutes_default() {
        let dir = tempfile::tempdir().unwrap();
        let (store, _) = EmbeddedVectorStore::open(dir.path()).await.unwrap();
        store.create_collection("c", 0).await.unwrap();
        let info = store.get_collection_info("c").await.unwrap();
        assert_eq!(info.vector_size, DEFAULT_VECTOR_DIMENSION);
    }

    #[tokio::test]
    async fn persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let (store, _) = EmbeddedVectorStore::open(dir.path()).await.unwrap();
            store.create_collection("c", 2).await.unwrap();
            store.upsert("c", vec![doc("d1", vec![1.0, 1.0])]).await.unwrap();
        }
        let (store, quarantined) = EmbeddedVectorStore::open(dir.path()).await.unwrap();
        assert!(quarantined.is_empty());
        let docs = store.get("c", &["d1".to_owned()]).await.unwrap();
        assert_eq!(docs.len(), 1);
    }

    #[tokio::test]
    async fn corrupt_collection_is_quarantined_and_others_still_load() {
        let dir = tempfile::tempdir().unwrap();
        {
            let (store, _) = EmbeddedVectorStore::open(dir.path()).await.unwrap();
            store.create_collection("healthy", 2).await.unwrap();
        }
        std::fs::create_dir_all(dir.path().join("deadbeef")).unwrap();
        // no metadata file written inside "deadbeef" -> corrupt

        let (store, quarantined) = EmbeddedVectorStore::open(dir.path()).await.unwrap();
        assert_eq!(quarantined, vec!["deadbeef".to_owned()]);
        assert!(store.collection_exists("healthy").await.unwrap());
        assert!(dir.path().join(".quarantine").join("deadbeef").exists());
    }

    #[tokio::test]
    async fn delete_removes_document_and_file() {
        let dir = tempfile::tempdir().unwrap();
        let (store, _) = EmbeddedVectorStore::open(dir.path()).await.unwrap();
        store.create_collection("c", 2).await.unwrap();
        store.upsert("c", vec![doc("d1", vec![1.0, 1.0])]).await.unwrap();
        store.delete("c", &["d1".to_owned()]).await.unwrap();
        assert!(store.get("c", &["d1".to_owned()]).await.unwrap().is_empty());
    }
}
