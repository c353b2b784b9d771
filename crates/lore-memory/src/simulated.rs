//! In-process memory backend.
//!
//! Holds entries in a `Vec` behind a read-write lock. Nothing survives the
//! process; this is the development and test backend, and the fallback when
//! no durable backend is configured.

use async_trait::async_trait;
use lore_core::types::utc_timestamp;
use parking_lot::RwLock;
use serde_json::Value;
use uuid::Uuid;

use crate::service::{relevance, tags_overlap, MemoryService};
use crate::types::{MemoryEntry, MemoryHit, MemoryQueryResult, MemoryStats, MemoryStoreResult};

/// The in-process backend.
#[derive(Debug, Default)]
pub struct SimulatedMemory {
    entries: RwLock<Vec<MemoryEntry>>,
}

impl SimulatedMemory {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with entries, for tests and demos.
    #[must_use]
    pub fn with_entries(entries: Vec<MemoryEntry>) -> Self {
        Self {
            entries: RwLock::new(entries),
        }
    }

    /// Number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[async_trait]
impl MemoryService for SimulatedMemory {
    fn name(&self) -> &'static str {
        "simulated"
    }

    async fn store(&self, content: &str, tags: &[String], metadata: Value) -> MemoryStoreResult {
        let entry = MemoryEntry {
            id: Uuid::now_v7().to_string(),
            content: content.to_string(),
            tags: tags.to_vec(),
            metadata,
            created_at: utc_timestamp(),
        };
        let id = entry.id.clone();
        self.entries.write().push(entry);
        MemoryStoreResult::stored(id)
    }

    async fn recall(
        &self,
        query: &str,
        n_results: usize,
        tags: Option<&[String]>,
    ) -> MemoryQueryResult {
        let entries = self.entries.read();
        let mut hits: Vec<MemoryHit> = entries
            .iter()
            .filter(|e| tags.is_none_or(|wanted| tags_overlap(&e.tags, wanted)))
            .filter_map(|e| {
                let score = relevance(query, &e.content);
                (score > 0.0).then(|| MemoryHit {
                    content: e.content.clone(),
                    relevance: score,
                    tags: e.tags.clone(),
                    timestamp: e.created_at.clone(),
                })
            })
            .collect();
        // Best match first; ties broken newest-first (timestamps are RFC 3339
        // in UTC, so the lexicographic order is chronological).
        hits.sort_by(|a, b| {
            b.relevance
                .partial_cmp(&a.relevance)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.timestamp.cmp(&a.timestamp))
        });
        hits.truncate(n_results);
        MemoryQueryResult::hits(hits)
    }

    async fn search_by_tag(&self, tags: &[String], limit: usize) -> MemoryQueryResult {
        let entries = self.entries.read();
        let mut hits: Vec<MemoryHit> = entries
            .iter()
            .filter(|e| tags_overlap(&e.tags, tags))
            .map(|e| MemoryHit {
                content: e.content.clone(),
                relevance: 1.0,
                tags: e.tags.clone(),
                timestamp: e.created_at.clone(),
            })
            .collect();
        hits.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        hits.truncate(limit);
        MemoryQueryResult::hits(hits)
    }

    async fn stats(&self) -> MemoryStats {
        let entries = self.entries.read();
        let mut distinct: Vec<&str> = entries
            .iter()
            .flat_map(|e| e.tags.iter().map(String::as_str))
            .collect();
        distinct.sort_unstable();
        distinct.dedup();
        MemoryStats::operational(self.name(), entries.len() as u64, distinct.len() as u64)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    async fn seeded() -> SimulatedMemory {
        let memory = SimulatedMemory::new();
        let _ = memory
            .store(
                "prefer rebase over merge for feature branches",
                &["git".to_string(), "workflow".to_string()],
                Value::Null,
            )
            .await;
        let _ = memory
            .store(
                "wiki headers use six equals signs",
                &["dokuwiki".to_string()],
                Value::Null,
            )
            .await;
        let _ = memory
            .store(
                "rebase interactive squashes commits",
                &["git".to_string()],
                Value::Null,
            )
            .await;
        memory
    }

    #[tokio::test]
    async fn store_returns_id_and_grows() {
        let memory = SimulatedMemory::new();
        let result = memory.store("note", &[], Value::Null).await;
        assert!(result.success);
        assert!(result.id.is_some());
        assert_eq!(memory.len(), 1);
    }

    #[tokio::test]
    async fn recall_orders_by_relevance() {
        let memory = seeded().await;
        let result = memory.recall("rebase feature branches", 10, None).await;
        assert!(result.success);
        assert_eq!(result.results.len(), 2);
        // The entry matching all three tokens outranks the one-token match.
        assert!(result.results[0].content.contains("feature branches"));
        assert!(result.results[0].relevance > result.results[1].relevance);
    }

    #[tokio::test]
    async fn recall_respects_n_results() {
        let memory = seeded().await;
        let result = memory.recall("rebase", 1, None).await;
        assert_eq!(result.results.len(), 1);
    }

    #[tokio::test]
    async fn recall_with_tag_filter() {
        let memory = seeded().await;
        let wanted = vec!["dokuwiki".to_string()];
        let result = memory.recall("headers", 10, Some(&wanted)).await;
        assert_eq!(result.results.len(), 1);
        assert!(result.results[0].content.contains("six equals"));

        let wanted = vec!["git".to_string()];
        let result = memory.recall("headers", 10, Some(&wanted)).await;
        assert!(result.results.is_empty());
    }

    #[tokio::test]
    async fn recall_empty_query_returns_nothing() {
        let memory = seeded().await;
        let result = memory.recall("", 10, None).await;
        assert!(result.success);
        assert!(result.results.is_empty());
    }

    #[tokio::test]
    async fn search_by_tag_matches_any() {
        let memory = seeded().await;
        let result = memory
            .search_by_tag(&["git".to_string(), "nonexistent".to_string()], 10)
            .await;
        assert_eq!(result.results.len(), 2);
        for hit in &result.results {
            assert!((hit.relevance - 1.0).abs() < f64::EPSILON);
        }
    }

    #[tokio::test]
    async fn search_by_tag_respects_limit() {
        let memory = seeded().await;
        let result = memory.search_by_tag(&["git".to_string()], 1).await;
        assert_eq!(result.results.len(), 1);
    }

    #[tokio::test]
    async fn stats_counts_entries_and_distinct_tags() {
        let memory = seeded().await;
        let stats = memory.stats().await;
        assert!(stats.success);
        assert_eq!(stats.backend_name, "simulated");
        assert_eq!(stats.total, 3);
        assert_eq!(stats.tags, 3); // git, workflow, dokuwiki
    }

    #[tokio::test]
    async fn empty_store_is_operational() {
        let memory = SimulatedMemory::new();
        let stats = memory.stats().await;
        assert!(stats.success);
        assert_eq!(stats.total, 0);
    }
}
