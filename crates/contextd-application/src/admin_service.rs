//! Collection admin operations (spec §6 `collection_create`/`_delete`/
//! `_list`). These tools take a raw `collectionName` rather than an
//! owner/project/branch triple, so every write is re-validated against the
//! authenticated owner before it reaches the store (spec §4.1: "ownership
//! is re-checked against the authenticated owner on every access").

use std::sync::Arc;

use contextd_domain::error::{Error, Result};
use contextd_domain::identity::CollectionName;
use contextd_domain::ports::VectorStoreProvider;

/// Collection lifecycle operations scoped to the authenticated owner.
pub struct AdminService {
    vector_store: Arc<dyn VectorStoreProvider>,
}

impl AdminService {
    /// Build an admin service over the given vector store.
    #[must_use]
    pub fn new(vector_store: Arc<dyn VectorStoreProvider>) -> Self {
        Self { vector_store }
    }

    fn authorize(owner_id: &str, collection_name: &str) -> Result<()> {
        let parsed = CollectionName::parse(collection_name)?;
        if parsed.owner_id != owner_id {
            return Err(Error::auth(format!("owner {owner_id} does not own collection {collection_name}")));
        }
        Ok(())
    }

    /// Create a collection owned by `owner_id` (spec §6 `collection_create`,
    /// async tool).
    pub async fn create_collection(&self, owner_id: &str, collection_name: &str, vector_size: usize) -> Result<()> {
        Self::authorize(owner_id, collection_name)?;
        if self.vector_store.collection_exists(collection_name).await? {
            return Err(Error::already_exists(collection_name));
        }
        self.vector_store.create_collection(collection_name, vector_size).await
    }

    /// Delete a collection owned by `owner_id` (spec §6 `collection_delete`,
    /// async tool).
    pub async fn delete_collection(&self, owner_id: &str, collection_name: &str) -> Result<()> {
        Self::authorize(owner_id, collection_name)?;
        self.vector_store.delete_collection(collection_name).await
    }

    /// List every collection owned by `owner_id` (spec §6 `collection_list`,
    /// "list filtered by owner prefix").
    pub async fn list_collections(&self, owner_id: &str) -> Result<Vec<String>> {
        let prefix = format!("owner_{owner_id}/");
        let names = self.vector_store.list_collections().await?;
        Ok(names.into_iter().filter(|name| name.starts_with(&prefix)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contextd_domain::entities::Document;
    use contextd_domain::ports::{CollectionInfo, SearchHit};
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeStore {
        collections: Mutex<Vec<String>>,
    }

    #[async_trait::async_trait]
    impl VectorStoreProvider for FakeStore {
        async fn create_collection(&self, name: &str, _vector_size: usize) -> Result<()> {
            self.collections.lock().unwrap().push(name.to_owned());
            Ok(())
        }
        async fn delete_collection(&self, name: &str) -> Result<()> {
            self.collections.lock().unwrap().retain(|n| n != name);
            Ok(())
        }
        async fn collection_exists(&self, name: &str) -> Result<bool> {
            Ok(self.collections.lock().unwrap().iter().any(|n| n == name))
        }
        async fn list_collections(&self) -> Result<Vec<String>> {
            Ok(self.collections.lock().unwrap().clone())
        }
        async fn get_collection_info(&self, name: &str) -> Result<CollectionInfo> {
            Err(Error::not_found(name))
        }
        async fn upsert(&self, _collection: &str, _points: Vec<Document>) -> Result<()> {
            Ok(())
        }
        async fn search(&self, _collection: &str, _query_vector: &[f32], _limit: usize, _filter: Option<&str>) -> Result<Vec<SearchHit>> {
            Ok(Vec::new())
        }
        async fn get(&self, _collection: &str, _ids: &[String]) -> Result<Vec<Document>> {
            Ok(Vec::new())
        }
        async fn delete(&self, _collection: &str, _ids: &[String]) -> Result<()> {
            Ok(())
        }
        async fn health(&self) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn create_rejects_collection_not_owned_by_caller() {
        let svc = AdminService::new(Arc::new(FakeStore::default()));
        let result = svc.create_collection("alice", "owner_bob/project_x/main", 384).await;
        assert!(matches!(result, Err(Error::AuthError { .. })));
    }

    #[tokio::test]
    async fn list_filters_by_owner_prefix() {
        let store = Arc::new(FakeStore::default());
        let svc = AdminService::new(Arc::clone(&store) as Arc<dyn VectorStoreProvider>);
        svc.create_collection("alice", "owner_alice/project_x/main", 384).await.unwrap();
        store.create_collection("owner_bob/project_y/main", 384).await.unwrap();
        let names = svc.list_collections("alice").await.unwrap();
        assert_eq!(names, vec!["owner_alice/project_x/main".to_owned()]);
    }
}
