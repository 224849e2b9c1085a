//! Background consolidation scheduler (spec §4.9 "Triggers" / §5
//! "Cancellation"). No direct teacher analog — the lifecycle (`Start`
//! errors if already running, `Stop` waits bounded time for the in-flight
//! run, both idempotent) is implemented with the idiomatic
//! `tokio_util::sync::CancellationToken` + `tokio::time::interval` pattern
//! this workspace already depends on for graceful shutdown.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use contextd_domain::error::{Error, Result};
use contextd_domain::identity::CollectionName;
use contextd_domain::ports::VectorStoreProvider;

use crate::distiller::{ConsolidateOptions, Distiller};

/// How long `Stop` waits for an in-flight consolidation run to quiesce
/// before giving up and returning anyway.
const STOP_GRACE_PERIOD: Duration = Duration::from_secs(30);

const SCOPE_SUFFIXES_TO_SKIP: &[&str] = &["__checkpoint", "__remediation", "__repository"];

/// Drives [`Distiller::consolidate`] at a fixed interval across every known
/// memory collection (spec §4.9 "Scheduler" trigger).
pub struct Scheduler {
    distiller: Arc<Distiller>,
    vector_store: Arc<dyn VectorStoreProvider>,
    interval: Duration,
    running: AtomicBool,
    cancel: Mutex<Option<CancellationToken>>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Scheduler {
    /// Build a scheduler that fires `Consolidate` at `interval` for every
    /// project with a memory collection.
    #[must_use]
    pub fn new(distiller: Arc<Distiller>, vector_store: Arc<dyn VectorStoreProvider>, interval: Duration) -> Self {
        Self { distiller, vector_store, interval, running: AtomicBool::new(false), cancel: Mutex::new(None), handle: Mutex::new(None) }
    }

    /// Start the background loop. Errors if already running (spec §4.9:
    /// "a second `Start` errors").
    pub async fn start(&self) -> Result<()> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(Error::internal("scheduler is already running"));
        }

        let token = CancellationToken::new();
        *self.cancel.lock().await = Some(token.clone());

        let distiller = Arc::clone(&self.distiller);
        let vector_store = Arc::clone(&self.vector_store);
        let interval = self.interval;
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await; // first tick fires immediately; consume it
            loop {
                tokio::select! {
                    () = token.cancelled() => break,
                    _ = ticker.tick() => {
                        run_once(&distiller, vector_store.as_ref()).await;
                    }
                }
            }
        });
        *self.handle.lock().await = Some(handle);
        Ok(())
    }

    /// Stop the background loop, waiting up to [`STOP_GRACE_PERIOD`] for
    /// the in-flight run to quiesce. No-ops if not running (spec §4.9: "a
    /// second `Stop` no-ops").
    pub async fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        if let Some(token) = self.cancel.lock().await.take() {
            token.cancel();
        }
        if let Some(handle) = self.handle.lock().await.take() {
            if tokio::time::timeout(STOP_GRACE_PERIOD, handle).await.is_err() {
                tracing::warn!("scheduler did not quiesce within the grace period");
            }
        }
    }

    /// Whether the background loop is currently running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

async fn run_once(distiller: &Distiller, vector_store: &dyn VectorStoreProvider) {
    let scopes = match discover_memory_scopes(vector_store).await {
        Ok(scopes) => scopes,
        Err(err) => {
            tracing::warn!(error = %err, "scheduler failed to list known projects, skipping this run");
            return;
        }
    };
    for (owner_id, project_id, branch) in scopes {
        let outcome = distiller.consolidate(&owner_id, &project_id, &branch, ConsolidateOptions::default()).await;
        if let Err(err) = outcome {
            tracing::warn!(error = %err, owner_id, project_id, branch, "scheduled consolidation run failed, continuing to next project");
        }
    }
}

/// Derive every `(ownerID, projectID, branch)` with a memory collection,
/// by listing and parsing collection names (spec §4.9: "walking all known
/// projects"). Skips checkpoint/remediation/repository-scoped collections.
async fn discover_memory_scopes(vector_store: &dyn VectorStoreProvider) -> Result<Vec<(String, String, String)>> {
    let names = vector_store.list_collections().await?;
    let mut scopes = Vec::new();
    for name in names {
        let Ok(parsed) = CollectionName::parse(&name) else { continue };
        if SCOPE_SUFFIXES_TO_SKIP.iter().any(|suffix| parsed.branch.ends_with(suffix)) {
            continue;
        }
        scopes.push((parsed.owner_id, parsed.project_id, parsed.branch));
    }
    Ok(scopes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use contextd_domain::entities::Document;
    use contextd_domain::error::Error;
    use contextd_domain::ports::{CollectionInfo, Embedding, EmbeddingProvider, SearchHit};
    use std::time::Duration as StdDuration;

    struct NoopEmbedder;
    #[async_trait::async_trait]
    impl EmbeddingProvider for NoopEmbedder {
        async fn embed(&self, texts: &[String]) -> Result<Vec<Embedding>> {
            Ok(texts.iter().map(|_| Embedding { vector: vec![] }).collect())
        }
        fn dim(&self) -> usize {
            0
        }
    }

    struct EmptyStore;
    #[async_trait::async_trait]
    impl VectorStoreProvider for EmptyStore {
        async fn create_collection(&self, _name: &str, _vector_size: usize) -> Result<()> {
            Ok(())
        }
        async fn delete_collection(&self, _name: &str) -> Result<()> {
            Ok(())
        }
        async fn collection_exists(&self, _name: &str) -> Result<bool> {
            Ok(false)
        }
        async fn list_collections(&self) -> Result<Vec<String>> {
            Ok(vec!["owner_a/project_b/main".into(), "owner_a/project_b/main__checkpoint".into()])
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
    async fn discovery_skips_non_memory_suffixes() {
        let scopes = discover_memory_scopes(&EmptyStore).await.unwrap();
        assert_eq!(scopes, vec![("a".to_owned(), "b".to_owned(), "main".to_owned())]);
    }

    #[tokio::test]
    async fn start_twice_errors_and_stop_is_idempotent() {
        let distiller = Arc::new(Distiller::new(Arc::new(EmptyStore), Arc::new(NoopEmbedder), None));
        let scheduler = Scheduler::new(distiller, Arc::new(EmptyStore), StdDuration::from_secs(3600));
        scheduler.start().await.unwrap();
        assert!(scheduler.start().await.is_err());
        scheduler.stop().await;
        scheduler.stop().await; // no-op, must not panic or hang
        assert!(!scheduler.is_running());
    }
}
