//! Effectiveness analysis and optimization suggestions.
//!
//! Scores how actively a context document is used and evolved, recommends
//! follow-ups per score band, and derives store-wide suggestions: template
//! candidates, review candidates, missing contexts, and proactive additions
//! from a reference list of common tool categories. Also provides the
//! post-session learning hook that summarizes an initialization pass and
//! records it to memory.

#![deny(unsafe_code)]

pub mod engine;
pub mod score;
pub mod types;

pub use engine::LearningEngine;
pub use score::effectiveness_score;
pub use types::{
    EffectivenessReport, OptimizationSuggestion, OptimizationType, ProactiveSuggestion,
    SuggestionKind, SuggestionPriority,
};
