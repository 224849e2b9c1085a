//! External vector-store RPC client (spec §4.2), with exponential-backoff
//! retry for transient errors only (unavailable/deadline/aborted/
//! resource-exhausted — here, any [`Error::is_transient`] error).
//!
//! Grounded on `reqwest`, the teacher's HTTP-client dependency; the
//! request/response JSON shapes mirror the `VectorStoreProvider` trait
//! one-for-one since there is no teacher RPC vector-store client to
//! imitate more specifically.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use contextd_domain::constants::RETRY_INITIAL_BACKOFF_MS;
use contextd_domain::entities::Document;
use contextd_domain::error::{Error, Result};
use contextd_domain::ports::{CollectionInfo, SearchHit, VectorStoreProvider};

use crate::config::VectorStoreConfig;

/// RPC client for a remote vector-store service speaking the same
/// collection/document model as [`VectorStoreProvider`] over plain JSON.
pub struct ExternalVectorStore {
    client: reqwest::Client,
    base_url: String,
    retry_attempts: u32,
}

impl ExternalVectorStore {
    /// Build a client from vector-store config (endpoint, timeouts, retry
    /// attempts).
    pub fn new(config: &VectorStoreConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.dial_timeout_secs))
            .timeout(Duration::from_secs(config.rpc_timeout_secs))
            .build()
            .map_err(|e| Error::vector_store(e.to_string()))?;
        Ok(Self { client, base_url: config.endpoint.trim_end_matches('/').to_owned(), retry_attempts: config.retry_attempts })
    }

    async fn call<T: Serialize + ?Sized, R: for<'de> Deserialize<'de>>(&self, method: reqwest::Method, path: &str, body: Option<&T>) -> Result<R> {
        retry_with_backoff(self.retry_attempts, || async {
            let url = format!("{}{}", self.base_url, path);
            let mut request = self.client.request(method.clone(), &url);
            if let Some(body) = body {
                request = request.json(body);
            }
            let response = request.send().await.map_err(classify_reqwest_error)?;
            if !response.status().is_success() {
                let transient = response.status().is_server_error();
                let message = format!("{} {}: {}", method, path, response.status());
                return Err(if transient { Error::vector_store_transient(message) } else { Error::vector_store(message) });
            }
            response.json::<R>().await.map_err(|e| Error::vector_store(e.to_string()))
        })
        .await
    }
}

fn classify_reqwest_error(err: reqwest::Error) -> Error {
    if err.is_timeout() || err.is_connect() {
        Error::vector_store_transient(err.to_string())
    } else {
        Error::vector_store(err.to_string())
    }
}

/// Retry `f` with exponential backoff starting at
/// [`RETRY_INITIAL_BACKOFF_MS`], doubling each attempt, up to `attempts`
/// total tries. Only [`Error::is_transient`] errors are retried; anything
/// else (or the final attempt) is returned immediately (spec §4.2).
async fn retry_with_backoff<T, F, Fut>(attempts: u32, mut f: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let mut backoff = Duration::from_millis(RETRY_INITIAL_BACKOFF_MS);
    let attempts = attempts.max(1);
    for attempt in 1..=attempts {
        match f().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() && attempt < attempts => {
                tracing::warn!(attempt, error = %err, "transient vector store error, retrying");
                tokio::time::sleep(backoff).await;
                backoff *= 2;
            }
            Err(err) => return Err(err),
        }
    }
    unreachable!("loop always returns on its last iteration")
}

#[derive(Serialize)]
struct CreateCollectionRequest {
    vector_size: usize,
}

#[derive(Serialize)]
struct UpsertRequest {
    points: Vec<Document>,
}

#[derive(Serialize)]
struct SearchRequest<'a> {
    query_vector: &'a [f32],
    limit: usize,
    filter: Option<&'a str>,
}

#[derive(Serialize)]
struct GetRequest<'a> {
    ids: &'a [String],
}

#[derive(Serialize)]
struct DeleteRequest<'a> {
    ids: &'a [String],
}

#[derive(Deserialize)]
struct ExistsResponse {
    exists: bool,
}

#[derive(Deserialize)]
struct ListResponse {
    names: Vec<String>,
}

#[async_trait]
impl VectorStoreProvider for ExternalVectorStore {
    async fn create_collection(&self, name: &str, vector_size: usize) -> Result<()> {
        self.call(reqwest::Method::POST, &format!("/collections/{name}"), Some(&CreateCollectionRequest { vector_size })).await
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        self.call::<(), ()>(reqwest::Method::DELETE, &format!("/collections/{name}"), None).await
    }

    async fn collection_exists(&self, name: &str) -> Result<bool> {
        let response: ExistsResponse = self.call::<(), _>(reqwest::Method::GET, &format!("/collections/{name}/exists"), None).await?;
        Ok(response.exists)
    }

    async fn list_collections(&self) -> Result<Vec<String>> {
        let response: ListResponse = self.call::<(), _>(reqwest::Method::GET, "/collections", None).await?;
        Ok(response.names)
    }

    async fn get_collection_info(&self, name: &str) -> Result<CollectionInfo> {
        #[derive(Deserialize)]
        struct InfoResponse {
            vector_size: usize,
            point_count: usize,
        }
        let response: InfoResponse = self.call::<(), _>(reqwest::Method::GET, &format!("/collections/{name}"), None).await?;
        Ok(CollectionInfo { name: name.to_owned(), vector_size: response.vector_size, point_count: response.point_count })
    }

    async fn upsert(&self, collection: &str, points: Vec<Document>) -> Result<()> {
        self.call(reqwest::Method::POST, &format!("/collections/{collection}/upsert"), Some(&UpsertRequest { points })).await
    }

    async fn search(&self, collection: &str, query_vector: &[f32], limit: usize, filter: Option<&str>) -> Result<Vec<SearchHit>> {
        #[derive(Deserialize)]
        struct Hit {
            document: Document,
            score: f32,
        }
        #[derive(Deserialize)]
        struct SearchResponse {
            hits: Vec<Hit>,
        }
        let response: SearchResponse = self
            .call(reqwest::Method::POST, &format!("/collections/{collection}/search"), Some(&SearchRequest { query_vector, limit, filter }))
            .await?;
        Ok(response.hits.into_iter().map(|hit| SearchHit { document: hit.document, score: hit.score }).collect())
    }

    async fn get(&self, collection: &str, ids: &[String]) -> Result<Vec<Document>> {
        #[derive(Deserialize)]
        struct GetResponse {
            documents: Vec<Document>,
        }
        let response: GetResponse = self.call(reqwest::Method::POST, &format!("/collections/{collection}/get"), Some(&GetRequest { ids })).await?;
        Ok(response.documents)
    }

    async fn delete(&self, collection: &str, ids: &[String]) -> Result<()> {
        self.call(reqwest::Method::POST, &format!("/collections/{collection}/delete"), Some(&DeleteRequest { ids })).await
    }

    async fn health(&self) -> Result<()> {
        self.call::<(), ()>(reqwest::Method::GET, "/health", None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn retry_stops_after_first_success() {
        let calls = AtomicU32::new(0);
        let result: Result<u32> = retry_with_backoff(3, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok(42) }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retry_gives_up_after_configured_attempts() {
        let calls = AtomicU32::new(0);
        let result: Result<u32> = retry_with_backoff(3, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(Error::vector_store_transient("down")) }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn non_transient_error_is_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<u32> = retry_with_backoff(3, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(Error::not_found("x")) }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
