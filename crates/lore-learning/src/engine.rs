//! The learning engine: per-context analysis, store-wide suggestions, and
//! the post-session insights hook.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use lore_core::types::{ContextDocument, UsageStats};
use lore_memory::MemoryService;
use lore_session::{SessionLearning, SessionStatus};
use lore_settings::LearningSettings;

use crate::score::effectiveness_score;
use crate::types::{
    EffectivenessReport, OptimizationSuggestion, OptimizationType, ProactiveSuggestion,
    SuggestionKind, SuggestionPriority,
};

/// Tag under which session insights are stored and recalled.
const INSIGHT_TAG: &str = "session-insight";

/// Tool categories a typical installation covers.
const REFERENCE_CATEGORIES: &[&str] = &["git", "filesystem", "memory", "web_search", "database"];

/// Category pairs that usually participate in the same workflows.
const CO_OCCURRING_PAIRS: &[(&str, &str)] = &[
    ("git", "filesystem"),
    ("memory", "git"),
    ("web_search", "memory"),
    ("database", "filesystem"),
];

/// Analyzes usage counters and the shape of the loaded store.
///
/// Scoring and banding are pure; only the session hook talks to the memory
/// backend, and strictly best-effort.
pub struct LearningEngine {
    memory: Arc<dyn MemoryService>,
    settings: LearningSettings,
}

impl LearningEngine {
    /// Engine over `memory` with the given scoring thresholds.
    #[must_use]
    pub fn new(memory: Arc<dyn MemoryService>, settings: LearningSettings) -> Self {
        Self { memory, settings }
    }

    /// The thresholds in effect.
    #[must_use]
    pub fn settings(&self) -> &LearningSettings {
        &self.settings
    }

    /// Score one context and derive its recommendation band.
    #[must_use]
    pub fn analyze(&self, name: &str, usage: &UsageStats) -> EffectivenessReport {
        let score = effectiveness_score(usage, &self.settings);
        let recommendations = self.recommendations(score);
        debug!(context = %name, score = score, "Effectiveness analyzed");
        EffectivenessReport {
            context_name: name.to_string(),
            score,
            usage: usage.clone(),
            recommendations,
        }
    }

    fn recommendations(&self, score: f64) -> Vec<String> {
        if score <= 0.0 {
            vec![
                "no observed usage; the document has never been exercised".to_string(),
                "keep the document minimal until real interactions accrue".to_string(),
            ]
        } else if score < self.settings.low_score_threshold {
            vec!["low activity; review the document for continued relevance".to_string()]
        } else if score >= self.settings.high_score_threshold {
            vec![
                "high usage; consider splitting specialized rules into a dedicated context"
                    .to_string(),
            ]
        } else {
            vec!["steady usage; no changes recommended".to_string()]
        }
    }

    /// Store-wide suggestions: a template candidate, review candidates, and
    /// missing contexts referenced via `applies_to_tools`.
    #[must_use]
    pub fn suggest_global_optimizations(
        &self,
        contexts: &[(String, ContextDocument)],
    ) -> Vec<OptimizationSuggestion> {
        let mut suggestions = Vec::new();

        let scored: Vec<(&str, f64)> = contexts
            .iter()
            .map(|(name, doc)| {
                (
                    name.as_str(),
                    effectiveness_score(&doc.metadata.usage, &self.settings),
                )
            })
            .collect();

        let template = scored
            .iter()
            .filter(|(_, score)| *score > 0.0)
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        if let Some((name, score)) = template {
            suggestions.push(OptimizationSuggestion {
                context_name: (*name).to_string(),
                optimization_type: OptimizationType::GlobalAnalysis,
                priority: SuggestionPriority::Medium,
                description: format!(
                    "highest effectiveness score ({score:.2}); use as a template when drafting new contexts"
                ),
            });
        }

        for (name, score) in &scored {
            if *score < self.settings.low_score_threshold {
                suggestions.push(OptimizationSuggestion {
                    context_name: (*name).to_string(),
                    optimization_type: OptimizationType::GlobalAnalysis,
                    priority: SuggestionPriority::Low,
                    description: format!(
                        "effectiveness score {score:.2} is below the review threshold ({}); review for relevance or retire",
                        self.settings.low_score_threshold
                    ),
                });
            }
        }

        let loaded: HashSet<&str> = contexts.iter().map(|(name, _)| name.as_str()).collect();
        let mut missing: BTreeSet<(&str, &str)> = BTreeSet::new();
        for (name, doc) in contexts {
            for target in &doc.metadata.applies_to_tools {
                let category = target.split(':').next().unwrap_or_default();
                if !category.is_empty() && !loaded.contains(category) {
                    let _ = missing.insert((category, name.as_str()));
                }
            }
        }
        for (category, referenced_by) in missing {
            suggestions.push(OptimizationSuggestion {
                context_name: category.to_string(),
                optimization_type: OptimizationType::GlobalAnalysis,
                priority: SuggestionPriority::High,
                description: format!(
                    "`{referenced_by}` applies to `{category}` tools but no `{category}` context exists; consider creating one"
                ),
            });
        }

        suggestions
    }

    /// Suggestions derived from which names are loaded, without reading any
    /// document content.
    #[must_use]
    pub fn proactive_suggestions(&self, loaded: &[String]) -> Vec<ProactiveSuggestion> {
        let present: HashSet<&str> = loaded.iter().map(String::as_str).collect();
        let mut suggestions = Vec::new();

        for category in REFERENCE_CATEGORIES {
            if !present.contains(category) {
                suggestions.push(ProactiveSuggestion {
                    kind: SuggestionKind::MissingCommonContext,
                    description: format!(
                        "no context for the commonly used `{category}` category; consider creating one"
                    ),
                    confidence: 0.6,
                });
            }
        }

        for (a, b) in CO_OCCURRING_PAIRS {
            let (have, miss) = match (present.contains(a), present.contains(b)) {
                (true, false) => (a, b),
                (false, true) => (b, a),
                _ => continue,
            };
            suggestions.push(ProactiveSuggestion {
                kind: SuggestionKind::WorkflowCombination,
                description: format!(
                    "`{have}` is loaded but its frequent companion `{miss}` is not; workflows spanning both would benefit from a `{miss}` context"
                ),
                confidence: 0.5,
            });
        }

        suggestions
    }
}

#[async_trait]
impl SessionLearning for LearningEngine {
    async fn session_insights(&self, status: &SessionStatus) -> Vec<String> {
        let mut insights = Vec::new();

        if status.executed_actions.is_empty() {
            insights.push("no startup actions were declared by loaded contexts".to_string());
        } else {
            insights.push(format!(
                "{} startup actions retrieved {} memories in {:.2}s",
                status.executed_actions.len(),
                status.memory_retrieval_results,
                status.execution_time_seconds,
            ));
            if !status.errors.is_empty() {
                insights.push(format!(
                    "{} startup actions failed; check memory backend availability",
                    status.errors.len()
                ));
            }
        }

        let prior = self.memory.search_by_tag(&[INSIGHT_TAG.to_string()], 3).await;
        if prior.success {
            if !prior.results.is_empty() {
                insights.push(format!(
                    "{} prior session insights on record",
                    prior.results.len()
                ));
            }
        } else {
            debug!(
                error = prior.error.as_deref().unwrap_or("unknown"),
                "Prior-insight lookup unavailable"
            );
        }

        let summary = insights.join("; ");
        let tags = vec![INSIGHT_TAG.to_string(), "learning".to_string()];
        let stored = self.memory.store(&summary, &tags, Value::Null).await;
        if !stored.success {
            debug!(
                error = stored.error.as_deref().unwrap_or("unknown"),
                "Session insight not stored"
            );
        }

        insights
    }
}

impl std::fmt::Debug for LearningEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LearningEngine")
            .field("backend", &self.memory.name())
            .field("settings", &self.settings)
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
