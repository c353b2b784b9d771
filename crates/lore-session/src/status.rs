//! Session lifecycle state and the run report.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Lifecycle of the initialization pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// No pass has run yet.
    #[default]
    Uninitialized,
    /// A pass is executing.
    Running,
    /// The last pass finished. Terminal, reached even when every action
    /// failed.
    Completed,
}

/// One startup action with its recorded outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutedAction {
    /// Context document that declared the action.
    pub context: String,
    /// Wire name of the action (`recall_memory`, `search_by_tag`).
    pub action: String,
    /// Parameters as declared in the document.
    pub parameters: Value,
    /// Backend payload when the action succeeded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Failure or timeout description when it did not.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Report of the most recent initialization pass.
///
/// Replaced wholesale on re-run, never merged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionStatus {
    /// Whether a pass has completed.
    pub initialized: bool,
    /// Wall-clock duration of the pass.
    pub execution_time_seconds: f64,
    /// Every action that ran, in execution order.
    pub executed_actions: Vec<ExecutedAction>,
    /// Accumulated failure descriptions, one per failed action.
    pub errors: Vec<String>,
    /// Insight lines contributed by the learning hook.
    pub learning_insights: Vec<String>,
    /// Total entries the memory actions retrieved.
    pub memory_retrieval_results: u64,
}

impl SessionStatus {
    /// Count of actions that recorded an error.
    #[must_use]
    pub fn failed_actions(&self) -> usize {
        self.executed_actions
            .iter()
            .filter(|a| a.error.is_some())
            .count()
    }
}

/// Post-run hook deriving insight lines from a finished pass.
///
/// Implementations observe the status after all actions have executed; the
/// returned lines are folded into `learning_insights` before the status is
/// published.
#[async_trait]
pub trait SessionLearning: Send + Sync {
    /// Insight lines for the finished pass.
    async fn session_insights(&self, status: &SessionStatus) -> Vec<String>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
