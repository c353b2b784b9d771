//! Analysis and suggestion payloads.

use lore_core::types::UsageStats;
use serde::{Deserialize, Serialize};

/// What a suggestion proposes to improve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizationType {
    /// Add or sharpen rules in a pattern section.
    PatternImprovement,
    /// Adjust preference values.
    PreferenceTuning,
    /// Rework syntax rules.
    RuleRefinement,
    /// Store-wide observation rather than a single-section change.
    GlobalAnalysis,
}

/// Urgency of acting on a suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionPriority {
    /// Act whenever convenient.
    Low,
    /// Worth scheduling.
    Medium,
    /// Gaps that degrade day-to-day behavior.
    High,
}

/// A recommendation targeting one context (or the store as a whole).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationSuggestion {
    /// Context the suggestion is about.
    pub context_name: String,
    /// What kind of change is proposed.
    pub optimization_type: OptimizationType,
    /// How urgent it is.
    pub priority: SuggestionPriority,
    /// Human-readable proposal.
    pub description: String,
}

/// Kinds of suggestions derived from the loaded set as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionKind {
    /// A commonly used tool category has no context document.
    MissingCommonContext,
    /// Two categories that usually work together are only partially covered.
    WorkflowCombination,
}

/// A suggestion produced without looking at any one document's content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProactiveSuggestion {
    /// Which heuristic produced it.
    pub kind: SuggestionKind,
    /// Human-readable proposal.
    pub description: String,
    /// Heuristic confidence in `[0, 1]`.
    pub confidence: f64,
}

/// Effectiveness analysis for one context.
///
/// Recommendation bands are monotonic in the score: no observed usage at
/// score zero, low activity below the configured low threshold, steady in
/// between, high usage at or above the high threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectivenessReport {
    /// The analyzed context.
    pub context_name: String,
    /// Score in `[0, 1]`.
    pub score: f64,
    /// The counters the score was derived from.
    pub usage: UsageStats,
    /// Band-dependent follow-up recommendations.
    pub recommendations: Vec<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optimization_type_serializes_snake_case() {
        let json = serde_json::to_string(&OptimizationType::PatternImprovement).unwrap();
        assert_eq!(json, "\"pattern_improvement\"");
        let json = serde_json::to_string(&OptimizationType::GlobalAnalysis).unwrap();
        assert_eq!(json, "\"global_analysis\"");
    }

    #[test]
    fn priority_orders_low_to_high() {
        assert!(SuggestionPriority::Low < SuggestionPriority::Medium);
        assert!(SuggestionPriority::Medium < SuggestionPriority::High);
    }

    #[test]
    fn suggestion_round_trips() {
        let suggestion = OptimizationSuggestion {
            context_name: "git".to_string(),
            optimization_type: OptimizationType::PreferenceTuning,
            priority: SuggestionPriority::Medium,
            description: "tune rebase preferences".to_string(),
        };
        let json = serde_json::to_string(&suggestion).unwrap();
        let back: OptimizationSuggestion = serde_json::from_str(&json).unwrap();
        assert_eq!(suggestion, back);
    }

    #[test]
    fn proactive_kind_serializes_snake_case() {
        let json = serde_json::to_string(&SuggestionKind::MissingCommonContext).unwrap();
        assert_eq!(json, "\"missing_common_context\"");
    }
}
