//! Effectiveness scoring.

use lore_core::types::UsageStats;
use lore_settings::LearningSettings;

/// Heuristic effectiveness score in `[0, 1]`.
///
/// A document with no observed usage scores `0.0`. Otherwise the score is a
/// base of `0.3` for being in use at all, plus up to `0.4` for update
/// activity and up to `0.3` for pattern evolution, each component scaled
/// linearly against its configured saturation point and capped there.
#[must_use]
pub fn effectiveness_score(usage: &UsageStats, settings: &LearningSettings) -> f64 {
    if usage.total_interactions == 0 {
        return 0.0;
    }

    #[allow(clippy::cast_precision_loss)] // counters never approach 2^52
    let activity = {
        let saturation = settings.update_saturation.max(1) as f64;
        0.4 * (usage.update_count as f64 / saturation).min(1.0)
    };
    #[allow(clippy::cast_precision_loss)]
    let evolution = {
        let saturation = settings.addition_saturation.max(1) as f64;
        0.3 * (usage.pattern_additions as f64 / saturation).min(1.0)
    };

    (0.3 + activity + evolution).clamp(0.0, 1.0)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
