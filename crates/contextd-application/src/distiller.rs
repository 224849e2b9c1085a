//! Memory distiller: the consolidation engine (spec §4.9). Clusters
//! near-duplicate Active memories by embedding similarity and synthesizes
//! one higher-confidence replacement per cluster, archiving the sources
//! with bidirectional back-links.
//!
//! Grounded on `mcb-application::use_cases::memory_service`'s
//! embed-then-rescore shape for the vector-store interaction, and on the
//! teacher's `ports::services` convention of a plain struct over `Arc<dyn
//! Port>` fields for a stateful use case (the per-project timestamp map is
//! the only state this crate's services hold, matching the teacher's
//! session/metrics services).

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Deserialize;

use contextd_domain::constants::{
    CONSENSUS_BONUS_CAP, CONSENSUS_BONUS_PER_MEMBER, DEFAULT_CONSOLIDATION_THRESHOLD,
    DEFAULT_CONSOLIDATION_WINDOW_SECS, USAGE_WEIGHT_FLOOR,
};
use contextd_domain::entities::{MemoryKind, MemoryRecord, MemoryState};
use contextd_domain::error::Result;
use contextd_domain::ports::{EmbeddingProvider, LlmProvider, VectorStoreProvider};
use contextd_domain::similarity::cosine_similarity;

use crate::scope::collection_name_for;

/// Inputs to one consolidation run (spec §4.9 "Inputs").
#[derive(Debug, Clone, Default)]
pub struct ConsolidateOptions {
    /// Clustering similarity threshold. Defaults to 0.80.
    pub threshold: Option<f32>,
    /// Per-project consolidation window, in seconds. Defaults to 24h.
    pub window_secs: Option<i64>,
    /// Build and rank clusters without persisting anything, and without
    /// updating the per-project last-consolidated timestamp.
    pub dry_run: bool,
    /// Bypass the consolidation window check.
    pub force_all: bool,
}

/// Result of one consolidation run.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub enum ConsolidateOutcome {
    /// The project was consolidated within the window and `forceAll` was
    /// not set; nothing was done.
    Skipped,
    /// Consolidation ran. `dry_run` mirrors the option that produced it.
    Completed {
        /// Number of clusters of size >= 2 found.
        clusters_merged: usize,
        /// Total source memories archived across all clusters.
        memories_archived: usize,
        /// Whether this run persisted anything.
        dry_run: bool,
    },
}

#[derive(Debug, Deserialize)]
struct SynthesizedMemory {
    #[serde(default)]
    #[allow(dead_code)]
    title: String,
    description: String,
    content: String,
    #[serde(default)]
    tags: Vec<String>,
}

/// The consolidation engine. Holds the one piece of state the distiller
/// owns: the per-project `lastConsolidatedAt` map (spec §4.9 step 1).
pub struct Distiller {
    vector_store: Arc<dyn VectorStoreProvider>,
    embedder: Arc<dyn EmbeddingProvider>,
    llm: Option<Arc<dyn LlmProvider>>,
    last_consolidated_at: DashMap<String, DateTime<Utc>>,
}

impl Distiller {
    /// Build a distiller. `llm` is optional: if absent (or if it fails),
    /// every cluster falls back to deterministic synthesis (spec §4.9
    /// step 4).
    #[must_use]
    pub fn new(vector_store: Arc<dyn VectorStoreProvider>, embedder: Arc<dyn EmbeddingProvider>, llm: Option<Arc<dyn LlmProvider>>) -> Self {
        Self { vector_store, embedder, llm, last_consolidated_at: DashMap::new() }
    }

    /// Run consolidation for one owner/project/branch scope (spec §4.9
    /// "Algorithm"). Invoked identically by the `memory_consolidate` tool
    /// and by `Scheduler`'s background loop.
    pub async fn consolidate(&self, owner_id: &str, project_id: &str, branch: &str, options: ConsolidateOptions) -> Result<ConsolidateOutcome> {
        let scope_key = format!("{owner_id}/{project_id}/{branch}");
        let window = chrono::Duration::seconds(options.window_secs.unwrap_or(DEFAULT_CONSOLIDATION_WINDOW_SECS));
        let threshold = options.threshold.unwrap_or(DEFAULT_CONSOLIDATION_THRESHOLD);

        if !options.force_all {
            if let Some(last) = self.last_consolidated_at.get(&scope_key) {
                if Utc::now() - *last < window {
                    return Ok(ConsolidateOutcome::Skipped);
                }
            }
        }

        let collection = collection_name_for(owner_id, project_id, branch, MemoryKind::Memory);
        let candidates = self.load_active_candidates(&collection).await?;
        let clusters = cluster_by_similarity(&candidates, threshold);

        let mut clusters_merged = 0usize;
        let mut memories_archived = 0usize;

        for cluster in clusters {
            if cluster.len() < 2 {
                continue;
            }
            match self.synthesize_and_persist(&collection, &cluster, options.dry_run).await {
                Ok(archived) => {
                    clusters_merged += 1;
                    memories_archived += archived;
                }
                Err(err) => {
                    tracing::warn!(error = %err, owner_id, project_id, branch, "consolidation cluster failed, continuing");
                }
            }
        }

        if !options.dry_run {
            self.last_consolidated_at.insert(scope_key, Utc::now());
        }

        Ok(ConsolidateOutcome::Completed { clusters_merged, memories_archived, dry_run: options.dry_run })
    }

    async fn load_active_candidates(&self, collection: &str) -> Result<Vec<(MemoryRecord, Vec<f32>)>> {
        if !self.vector_store.collection_exists(collection).await? {
            return Ok(Vec::new());
        }
        let info = self.vector_store.get_collection_info(collection).await?;
        if info.point_count == 0 {
            return Ok(Vec::new());
        }
        let zero_vector = vec![0.0_f32; info.vector_size];
        let hits = self.vector_store.search(collection, &zero_vector, info.point_count, None).await?;
        let mut candidates = Vec::with_capacity(hits.len());
        for hit in hits {
            let record = MemoryRecord::from_document(&hit.document)?;
            if matches!(record.header.state, MemoryState::Active) {
                candidates.push((record, hit.document.vector));
            }
        }
        Ok(candidates)
    }

    async fn synthesize_and_persist(&self, collection: &str, cluster: &[(MemoryRecord, Vec<f32>)], dry_run: bool) -> Result<usize> {
        let synthesized = self.synthesize(cluster).await;
        let confidence = consolidated_confidence(cluster);
        let source_ids: Vec<String> = cluster.iter().map(|(record, _)| record.header.id.clone()).collect();
        let description = format!("Consolidated from memories: {}", source_ids.join(", "));

        let mut consolidated = MemoryRecord::new(synthesized.content, description, cluster[0].0.header.project_path.clone());
        consolidated.header.confidence = confidence;
        consolidated.header.archived_memory_ids = source_ids.clone();
        if !synthesized.tags.is_empty() {
            consolidated.description = format!("{} (tags: {})", consolidated.description, synthesized.tags.join(", "));
        }

        if dry_run {
            return Ok(cluster.len());
        }

        let embedding = self.embed_one(&consolidated.content).await?;
        self.vector_store.upsert(collection, vec![consolidated.to_document(embedding)]).await?;

        for (record, vector) in cluster {
            let mut archived = record.clone();
            archived.header.archive_into(&consolidated.header.id);
            self.vector_store.upsert(collection, vec![archived.to_document(vector.clone())]).await?;
        }

        Ok(cluster.len())
    }

    async fn synthesize(&self, cluster: &[(MemoryRecord, Vec<f32>)]) -> SynthesizedMemory {
        if let Some(llm) = &self.llm {
            let prompt = build_synthesis_prompt(cluster);
            match llm.complete(&prompt).await {
                Ok(text) => match serde_json::from_str::<SynthesizedMemory>(&text) {
                    Ok(parsed) => return parsed,
                    Err(err) => {
                        tracing::warn!(error = %err, "synthesis response failed to parse, falling back to deterministic synthesis");
                    }
                },
                Err(err) => {
                    tracing::warn!(error = %err, "LLM synthesis call failed, falling back to deterministic synthesis");
                }
            }
        }
        deterministic_synthesis(cluster)
    }

    async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        let mut embeddings = self.embedder.embed(std::slice::from_ref(&text.to_owned())).await?;
        embeddings
            .pop()
            .map(|e| e.vector)
            .ok_or_else(|| contextd_domain::error::Error::embedding("embedder returned no vectors for a single input"))
    }
}

/// Greedy single-pass clustering by cosine similarity against each
/// cluster's seed (spec §4.9 step 3).
fn cluster_by_similarity(candidates: &[(MemoryRecord, Vec<f32>)], threshold: f32) -> Vec<Vec<(MemoryRecord, Vec<f32>)>> {
    let mut clusters: Vec<Vec<(MemoryRecord, Vec<f32>)>> = Vec::new();
    for candidate in candidates {
        let mut placed = false;
        for cluster in &mut clusters {
            let seed_vector = &cluster[0].1;
            if cosine_similarity(seed_vector, &candidate.1) >= threshold {
                cluster.push(candidate.clone());
                placed = true;
                break;
            }
        }
        if !placed {
            clusters.push(vec![candidate.clone()]);
        }
    }
    clusters
}

/// Weighted-confidence synthesis formula (spec §4.9 step 5).
fn consolidated_confidence(cluster: &[(MemoryRecord, Vec<f32>)]) -> f32 {
    let mut weighted_sum = 0.0_f32;
    let mut weight_total = 0.0_f32;
    for (record, _) in cluster {
        let weight = (record.header.usage_count.max(USAGE_WEIGHT_FLOOR)) as f32;
        weighted_sum += weight * record.header.confidence;
        weight_total += weight;
    }
    let base = if weight_total > 0.0 { weighted_sum / weight_total } else { 0.0 };
    let consensus_bonus = (CONSENSUS_BONUS_PER_MEMBER * (cluster.len() as f32 - 1.0)).clamp(0.0, CONSENSUS_BONUS_CAP);
    (base + consensus_bonus).clamp(0.0, 1.0)
}

fn build_synthesis_prompt(cluster: &[(MemoryRecord, Vec<f32>)]) -> String {
    let mut prompt = String::from(
        "Synthesize the following related memories into one higher-confidence memory. \
         Respond as JSON: {\"title\": ..., \"description\": ..., \"content\": ..., \"tags\": [...]}.\n\n",
    );
    for (record, _) in cluster {
        prompt.push_str(&format!("- {}: {}\n", record.description, record.content));
    }
    prompt
}

/// Deterministic fallback synthesis: concatenation with separators (spec
/// §4.9 step 4, "on parse failure, fall back to a deterministic
/// synthesis").
fn deterministic_synthesis(cluster: &[(MemoryRecord, Vec<f32>)]) -> SynthesizedMemory {
    let content = cluster.iter().map(|(record, _)| record.content.as_str()).collect::<Vec<_>>().join("\n---\n");
    let description = cluster.iter().map(|(record, _)| record.description.as_str()).collect::<Vec<_>>().join("; ");
    SynthesizedMemory { title: String::new(), description, content, tags: Vec::new() }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_with(usage_count: u32, confidence: f32) -> MemoryRecord {
        let mut record = MemoryRecord::new("c", "d", "/tmp/p");
        record.header.usage_count = usage_count;
        record.header.confidence = confidence;
        record
    }

    #[test]
    fn consensus_bonus_caps_at_point_two() {
        let cluster: Vec<(MemoryRecord, Vec<f32>)> = (0..10).map(|_| (record_with(1, 0.5), vec![])).collect();
        let confidence = consolidated_confidence(&cluster);
        // base 0.5 + capped bonus 0.2 = 0.7
        assert!((confidence - 0.7).abs() < 1e-6);
    }

    #[test]
    fn usage_weight_floor_prevents_zero_weight() {
        let cluster = vec![(record_with(0, 0.9), vec![]), (record_with(0, 0.1), vec![])];
        let confidence = consolidated_confidence(&cluster);
        // both weights floor to 1, so it's a plain average plus the 1-member bonus.
        assert!((confidence - (0.5 + 0.10)).abs() < 1e-6);
    }

    #[test]
    fn confidence_is_always_in_unit_interval() {
        let cluster: Vec<(MemoryRecord, Vec<f32>)> = (0..20).map(|_| (record_with(1000, 1.0), vec![])).collect();
        let confidence = consolidated_confidence(&cluster);
        assert!((0.0..=1.0).contains(&confidence));
    }

    #[test]
    fn clustering_groups_similar_vectors_and_keeps_size_floor() {
        let a = (record_with(1, 0.5), vec![1.0, 0.0]);
        let b = (record_with(1, 0.5), vec![0.99, 0.01]);
        let c = (record_with(1, 0.5), vec![0.0, 1.0]);
        let clusters = cluster_by_similarity(&[a, b, c], 0.9);
        let sizes: Vec<usize> = clusters.iter().map(Vec::len).collect();
        assert!(sizes.contains(&2));
        assert!(sizes.contains(&1));
    }

    #[test]
    fn deterministic_fallback_concatenates_with_separators() {
        let cluster = vec![(record_with(1, 0.5), vec![]), (record_with(1, 0.5), vec![])];
        let synthesized = deterministic_synthesis(&cluster);
        assert!(synthesized.content.contains("---"));
    }
}
