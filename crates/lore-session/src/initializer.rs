//! Executes startup actions and publishes the run report.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use serde_json::Value;
use tracing::{debug, info, warn};

use lore_core::types::{ContextDocument, StartupAction};
use lore_memory::{MemoryQueryResult, MemoryService};

use crate::status::{ExecutedAction, SessionLearning, SessionState, SessionStatus};

/// Runs the startup actions declared by loaded context documents.
///
/// One sequential pass per session: every enabled `session_initialization`
/// block contributes its `on_startup` actions in document order. Each action
/// call is bounded by the configured timeout; failures and timeouts become
/// recorded errors and the pass always runs to completion.
pub struct SessionInitializer {
    memory: Arc<dyn MemoryService>,
    action_timeout: Duration,
    learning: Option<Arc<dyn SessionLearning>>,
    state: RwLock<SessionState>,
    status: RwLock<SessionStatus>,
}

impl SessionInitializer {
    /// Initializer over `memory`, bounding each action by `action_timeout`.
    #[must_use]
    pub fn new(memory: Arc<dyn MemoryService>, action_timeout: Duration) -> Self {
        Self {
            memory,
            action_timeout,
            learning: None,
            state: RwLock::new(SessionState::Uninitialized),
            status: RwLock::new(SessionStatus::default()),
        }
    }

    /// Attach a post-run learning hook.
    #[must_use]
    pub fn with_learning(mut self, learning: Arc<dyn SessionLearning>) -> Self {
        self.learning = Some(learning);
        self
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        *self.state.read()
    }

    /// Snapshot of the most recently published report.
    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.status.read().clone()
    }

    /// Run one initialization pass over `contexts` and publish the report.
    ///
    /// Re-running replaces the previous report wholesale.
    pub async fn run(&self, contexts: &[(String, ContextDocument)]) -> SessionStatus {
        *self.state.write() = SessionState::Running;
        let started = Instant::now();
        let mut status = SessionStatus::default();

        for (name, doc) in contexts {
            let Some(init) = &doc.session_initialization else {
                continue;
            };
            if !init.enabled {
                debug!(context = %name, "Session actions disabled");
                continue;
            }
            for action in &init.actions.on_startup {
                let (executed, retrieved) = self.execute_action(name, action).await;
                if let Some(error) = &executed.error {
                    status
                        .errors
                        .push(format!("{name}/{}: {error}", executed.action));
                }
                status.memory_retrieval_results += retrieved;
                status.executed_actions.push(executed);
            }
        }

        status.execution_time_seconds = started.elapsed().as_secs_f64();
        status.initialized = true;

        if let Some(learning) = &self.learning {
            status.learning_insights = learning.session_insights(&status).await;
        }

        info!(
            actions = status.executed_actions.len(),
            errors = status.errors.len(),
            retrieved = status.memory_retrieval_results,
            "Session initialization complete"
        );

        *self.status.write() = status.clone();
        *self.state.write() = SessionState::Completed;
        status
    }

    /// Run a single action, returning its record and how many entries it
    /// retrieved.
    async fn execute_action(&self, context: &str, action: &StartupAction) -> (ExecutedAction, u64) {
        let parameters = action.parameters();
        let outcome = tokio::time::timeout(self.action_timeout, self.dispatch(action)).await;

        let (result, error, retrieved) = match outcome {
            Ok(query) if query.success => {
                let retrieved = query.results.len() as u64;
                let payload = serde_json::to_value(&query).unwrap_or(Value::Null);
                (Some(payload), None, retrieved)
            }
            Ok(query) => {
                let error = query
                    .error
                    .unwrap_or_else(|| "backend reported failure".to_string());
                warn!(context = %context, action = %action.name(), error = %error, "Startup action failed");
                (None, Some(error), 0)
            }
            Err(_) => {
                let timeout_ms = self.action_timeout.as_millis();
                warn!(
                    context = %context,
                    action = %action.name(),
                    timeout_ms = %timeout_ms,
                    "Startup action timed out"
                );
                (None, Some(format!("timed out after {timeout_ms}ms")), 0)
            }
        };

        let executed = ExecutedAction {
            context: context.to_string(),
            action: action.name().to_string(),
            parameters,
            result,
            error,
        };
        (executed, retrieved)
    }

    async fn dispatch(&self, action: &StartupAction) -> MemoryQueryResult {
        match action {
            StartupAction::RecallMemory(params) => {
                self.memory.recall(&params.query, params.n_results, None).await
            }
            StartupAction::SearchByTag(params) => {
                self.memory.search_by_tag(&params.tags, params.limit).await
            }
        }
    }
}

impl std::fmt::Debug for SessionInitializer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionInitializer")
            .field("backend", &self.memory.name())
            .field("action_timeout", &self.action_timeout)
            .field("state", &*self.state.read())
            .finish_non_exhaustive()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
