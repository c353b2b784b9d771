//! The memory capability interface.
//!
//! Consumers (session initializer, learning engine, context manager) hold an
//! `Arc<dyn MemoryService>` and never know which implementation backs it.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::types::{MemoryQueryResult, MemoryStats, MemoryStoreResult};

/// Capability interface to the persistent-memory backend.
///
/// All methods are best-effort: implementations report failure through the
/// result payload's `success` flag and never panic or return an error type.
#[async_trait]
pub trait MemoryService: Send + Sync {
    /// Implementation name, used in stats and log lines.
    fn name(&self) -> &'static str;

    /// Persist a content string with tags and caller metadata.
    async fn store(&self, content: &str, tags: &[String], metadata: Value) -> MemoryStoreResult;

    /// Retrieve up to `n_results` entries relevant to a free-text query,
    /// best match first. `tags`, when given, restricts candidates to entries
    /// carrying at least one of them.
    async fn recall(
        &self,
        query: &str,
        n_results: usize,
        tags: Option<&[String]>,
    ) -> MemoryQueryResult;

    /// Retrieve up to `limit` entries carrying at least one of `tags`,
    /// newest first.
    async fn search_by_tag(&self, tags: &[String], limit: usize) -> MemoryQueryResult;

    /// Backend health and size snapshot.
    async fn stats(&self) -> MemoryStats;
}

/// Token-overlap relevance between a query and stored content, in `[0, 1]`.
///
/// The fraction of (lowercased, whitespace-split) query tokens that occur in
/// the content. Both shipped backends use this; a query with no tokens
/// matches nothing.
pub(crate) fn relevance(query: &str, content: &str) -> f64 {
    let content_lower = content.to_lowercase();
    let tokens: Vec<&str> = query.split_whitespace().collect();
    if tokens.is_empty() {
        return 0.0;
    }
    let matched = tokens
        .iter()
        .filter(|t| content_lower.contains(&t.to_lowercase()))
        .count();
    #[allow(clippy::cast_precision_loss)]
    {
        matched as f64 / tokens.len() as f64
    }
}

/// True when `entry_tags` carries at least one of `wanted`.
pub(crate) fn tags_overlap(entry_tags: &[String], wanted: &[String]) -> bool {
    wanted.iter().any(|w| entry_tags.iter().any(|t| t == w))
}

// Implement MemoryService for Arc<T> where T: MemoryService
#[async_trait]
impl<T: MemoryService> MemoryService for Arc<T>
where
    T: Send + Sync,
{
    fn name(&self) -> &'static str {
        (**self).name()
    }
    async fn store(&self, content: &str, tags: &[String], metadata: Value) -> MemoryStoreResult {
        (**self).store(content, tags, metadata).await
    }
    async fn recall(
        &self,
        query: &str,
        n_results: usize,
        tags: Option<&[String]>,
    ) -> MemoryQueryResult {
        (**self).recall(query, n_results, tags).await
    }
    async fn search_by_tag(&self, tags: &[String], limit: usize) -> MemoryQueryResult {
        (**self).search_by_tag(tags, limit).await
    }
    async fn stats(&self) -> MemoryStats {
        (**self).stats().await
    }
}
