//! File-backed `SQLite` memory backend.
//!
//! Single-connection store with WAL mode. Ranking happens in Rust over a
//! bounded window of recent rows: the backend is sized for thousands of
//! entries, not millions, and keeping the scoring identical to the simulated
//! backend means tests exercise one set of semantics.

use parking_lot::Mutex;
use rusqlite::{params, Connection};
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

use async_trait::async_trait;
use lore_core::types::utc_timestamp;
use lore_core::ContextError;

use crate::service::{relevance, tags_overlap, MemoryService};
use crate::types::{MemoryEntry, MemoryHit, MemoryQueryResult, MemoryStats, MemoryStoreResult};

/// Most recent rows considered by `recall` / `search_by_tag`.
const SCAN_WINDOW: usize = 512;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS memories (
    id TEXT PRIMARY KEY,
    content TEXT NOT NULL,
    tags TEXT NOT NULL DEFAULT '[]',
    metadata TEXT,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_memories_created_at ON memories(created_at);";

/// The `SQLite` backend.
pub struct SqliteMemory {
    conn: Mutex<Connection>,
}

impl SqliteMemory {
    /// Open (creating if needed) a database file.
    pub fn open(path: &str) -> Result<Self, ContextError> {
        let conn = Connection::open(path).map_err(|e| unavailable(&e))?;
        Self::with_connection(conn)
    }

    /// Open an in-memory database (for testing).
    pub fn in_memory() -> Result<Self, ContextError> {
        let conn = Connection::open_in_memory().map_err(|e| unavailable(&e))?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self, ContextError> {
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;\
             PRAGMA busy_timeout = 5000;\
             PRAGMA synchronous = NORMAL;",
        )
        .map_err(|e| unavailable(&e))?;
        conn.execute_batch(SCHEMA).map_err(|e| unavailable(&e))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Most recent entries, newest first.
    fn recent_entries(conn: &Connection, limit: usize) -> rusqlite::Result<Vec<MemoryEntry>> {
        let mut stmt = conn.prepare(
            "SELECT id, content, tags, metadata, created_at FROM memories
             ORDER BY created_at DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit], |row| {
            let tags_json: String = row.get(2)?;
            Ok(MemoryEntry {
                id: row.get(0)?,
                content: row.get(1)?,
                tags: serde_json::from_str(&tags_json).unwrap_or_default(),
                metadata: row.get::<_, Option<Value>>(3)?.unwrap_or(Value::Null),
                created_at: row.get(4)?,
            })
        })?;
        rows.collect()
    }
}

impl std::fmt::Debug for SqliteMemory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteMemory").finish_non_exhaustive()
    }
}

fn unavailable(e: &rusqlite::Error) -> ContextError {
    ContextError::BackendUnavailable {
        backend: "sqlite".to_string(),
        message: e.to_string(),
    }
}

#[async_trait]
impl MemoryService for SqliteMemory {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    async fn store(&self, content: &str, tags: &[String], metadata: Value) -> MemoryStoreResult {
        let id = Uuid::now_v7().to_string();
        let tags_json = serde_json::to_string(tags).unwrap_or_else(|_| "[]".to_string());
        let result = self.conn.lock().execute(
            "INSERT INTO memories (id, content, tags, metadata, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![id, content, tags_json, metadata, utc_timestamp()],
        );
        match result {
            Ok(_) => MemoryStoreResult::stored(id),
            Err(e) => {
                warn!(error = %e, "sqlite memory store failed");
                MemoryStoreResult::failed(e.to_string())
            }
        }
    }

    async fn recall(
        &self,
        query: &str,
        n_results: usize,
        tags: Option<&[String]>,
    ) -> MemoryQueryResult {
        let entries = match Self::recent_entries(&self.conn.lock(), SCAN_WINDOW) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(error = %e, "sqlite memory recall failed");
                return MemoryQueryResult::failed(e.to_string());
            }
        };
        let mut hits: Vec<MemoryHit> = entries
            .into_iter()
            .filter(|e| tags.is_none_or(|wanted| tags_overlap(&e.tags, wanted)))
            .filter_map(|e| {
                let score = relevance(query, &e.content);
                (score > 0.0).then_some(MemoryHit {
                    content: e.content,
                    relevance: score,
                    tags: e.tags,
                    timestamp: e.created_at,
                })
            })
            .collect();
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
        let entries = match Self::recent_entries(&self.conn.lock(), SCAN_WINDOW) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(error = %e, "sqlite memory tag search failed");
                return MemoryQueryResult::failed(e.to_string());
            }
        };
        let mut hits: Vec<MemoryHit> = entries
            .into_iter()
            .filter(|e| tags_overlap(&e.tags, tags))
            .map(|e| MemoryHit {
                content: e.content,
                relevance: 1.0,
                tags: e.tags,
                timestamp: e.created_at,
            })
            .collect();
        hits.truncate(limit);
        MemoryQueryResult::hits(hits)
    }

    async fn stats(&self) -> MemoryStats {
        let conn = self.conn.lock();
        let total: rusqlite::Result<u64> =
            conn.query_row("SELECT COUNT(*) FROM memories", [], |row| row.get(0));
        let total = match total {
            Ok(total) => total,
            Err(e) => {
                warn!(error = %e, "sqlite memory stats failed");
                return MemoryStats::failed(self.name(), e.to_string());
            }
        };
        let tag_rows: rusqlite::Result<Vec<String>> = conn
            .prepare("SELECT tags FROM memories")
            .and_then(|mut stmt| {
                stmt.query_map([], |row| row.get::<_, String>(0))?
                    .collect::<rusqlite::Result<Vec<String>>>()
            });
        match tag_rows {
            Ok(rows) => {
                let mut distinct: Vec<String> = rows
                    .iter()
                    .flat_map(|json| {
                        serde_json::from_str::<Vec<String>>(json).unwrap_or_default()
                    })
                    .collect();
                distinct.sort_unstable();
                distinct.dedup();
                MemoryStats::operational(self.name(), total, distinct.len() as u64)
            }
            Err(e) => {
                warn!(error = %e, "sqlite memory stats failed");
                MemoryStats::failed(self.name(), e.to_string())
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn store_and_recall_round_trip() {
        let memory = SqliteMemory::in_memory().unwrap();
        let stored = memory
            .store(
                "prefer rebase over merge",
                &["git".to_string()],
                serde_json::json!({"source": "test"}),
            )
            .await;
        assert!(stored.success);

        let result = memory.recall("rebase", 5, None).await;
        assert!(result.success);
        assert_eq!(result.results.len(), 1);
        assert_eq!(result.results[0].tags, vec!["git".to_string()]);
    }

    #[tokio::test]
    async fn recall_orders_by_relevance() {
        let memory = SqliteMemory::in_memory().unwrap();
        let _ = memory
            .store("rebase notes", &[], Value::Null)
            .await;
        let _ = memory
            .store("rebase feature branches cleanly", &[], Value::Null)
            .await;

        let result = memory.recall("rebase feature branches", 5, None).await;
        assert_eq!(result.results.len(), 2);
        assert!(result.results[0].content.contains("feature branches"));
    }

    #[tokio::test]
    async fn recall_with_tag_filter() {
        let memory = SqliteMemory::in_memory().unwrap();
        let _ = memory
            .store("git rebase tips", &["git".to_string()], Value::Null)
            .await;
        let _ = memory
            .store("rebase wiki page", &["dokuwiki".to_string()], Value::Null)
            .await;

        let wanted = vec!["git".to_string()];
        let result = memory.recall("rebase", 5, Some(&wanted)).await;
        assert_eq!(result.results.len(), 1);
        assert!(result.results[0].content.contains("tips"));
    }

    #[tokio::test]
    async fn search_by_tag_and_limit() {
        let memory = SqliteMemory::in_memory().unwrap();
        for i in 0..3 {
            let _ = memory
                .store(&format!("note {i}"), &["insight".to_string()], Value::Null)
                .await;
        }
        let result = memory.search_by_tag(&["insight".to_string()], 2).await;
        assert!(result.success);
        assert_eq!(result.results.len(), 2);
    }

    #[tokio::test]
    async fn stats_counts_rows_and_tags() {
        let memory = SqliteMemory::in_memory().unwrap();
        let _ = memory
            .store("a", &["x".to_string(), "y".to_string()], Value::Null)
            .await;
        let _ = memory.store("b", &["x".to_string()], Value::Null).await;

        let stats = memory.stats().await;
        assert!(stats.success);
        assert_eq!(stats.backend_name, "sqlite");
        assert_eq!(stats.total, 2);
        assert_eq!(stats.tags, 2);
    }

    #[tokio::test]
    async fn persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mem.db");
        let path_str = path.to_str().unwrap();

        {
            let memory = SqliteMemory::open(path_str).unwrap();
            let stored = memory
                .store("durable note", &["keep".to_string()], Value::Null)
                .await;
            assert!(stored.success);
        }

        let memory = SqliteMemory::open(path_str).unwrap();
        let result = memory.search_by_tag(&["keep".to_string()], 5).await;
        assert_eq!(result.results.len(), 1);
        assert_eq!(result.results[0].content, "durable note");
    }

    #[test]
    fn open_in_missing_directory_fails() {
        let result = SqliteMemory::open("/nonexistent-dir/sub/mem.db");
        assert!(matches!(
            result,
            Err(ContextError::BackendUnavailable { .. })
        ));
    }
}
