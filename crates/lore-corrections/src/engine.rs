//! Rule compilation and ordered application.

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use regex::RegexBuilder;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use lore_core::types::{ContextDocument, CorrectionRule};

/// One compiled find/replace rule.
struct CompiledRule {
    name: String,
    regex: regex::Regex,
    replacement: String,
}

/// A document's rules after compilation, in stored order.
///
/// Rules that failed to compile (or whose entry is not a
/// pattern/replacement pair — documents are hand-editable) are dropped here
/// and surface as warnings on every apply.
struct CompiledRuleSet {
    rules: Vec<CompiledRule>,
    warnings: Vec<String>,
}

impl CompiledRuleSet {
    fn from_document(doc: &ContextDocument) -> Self {
        let mut rules = Vec::new();
        let mut warnings = Vec::new();
        for (name, value) in &doc.auto_corrections {
            let rule: CorrectionRule = match serde_json::from_value(value.clone()) {
                Ok(rule) => rule,
                Err(e) => {
                    warn!(rule = %name, error = %e, "auto-correction entry is malformed, skipping");
                    warnings.push(format!("rule `{name}` is malformed: {e}"));
                    continue;
                }
            };
            // Multi-line mode so `^`/`$` anchor per line; corrections run
            // over whole tool outputs, not single lines.
            match RegexBuilder::new(&rule.pattern).multi_line(true).build() {
                Ok(regex) => rules.push(CompiledRule {
                    name: name.clone(),
                    regex,
                    replacement: rule.replacement,
                }),
                Err(e) => {
                    warn!(rule = %name, error = %e, "auto-correction pattern failed to compile, skipping");
                    warnings.push(format!("rule `{name}` failed to compile: {e}"));
                }
            }
        }
        Self { rules, warnings }
    }
}

/// Result of applying a document's corrections to a text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectionOutcome {
    /// The corrected text (equal to the input when nothing applied).
    pub text: String,
    /// How many rules matched at least once.
    pub rules_applied: usize,
    /// Rules skipped because their entry or pattern was unusable.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl CorrectionOutcome {
    /// Identity outcome: the text passed through untouched.
    #[must_use]
    pub fn unchanged(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            rules_applied: 0,
            warnings: Vec::new(),
        }
    }
}

/// Applies `auto_corrections` rules with a per-context compiled cache.
#[derive(Default)]
pub struct CorrectionEngine {
    cache: RwLock<HashMap<String, Arc<CompiledRuleSet>>>,
}

impl CorrectionEngine {
    /// Engine with an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply `name`'s corrections to `text`.
    ///
    /// Identity (never an error) when the document's `auto_convert` is
    /// false. Rules run in stored order and each sees the previous rule's
    /// output; every non-overlapping match is replaced, with `$1`-style
    /// backreferences honored in the replacement.
    pub fn apply(&self, name: &str, doc: &ContextDocument, text: &str) -> CorrectionOutcome {
        if !doc.auto_convert {
            return CorrectionOutcome::unchanged(text);
        }
        let set = self.rules_for(name, doc);

        let mut current = text.to_string();
        let mut applied = 0;
        for rule in &set.rules {
            let replaced = match rule.regex.replace_all(&current, rule.replacement.as_str()) {
                Cow::Borrowed(_) => None,
                Cow::Owned(next) => Some(next),
            };
            if let Some(next) = replaced {
                debug!(rule = %rule.name, context = %name, "auto-correction applied");
                applied += 1;
                current = next;
            }
        }
        CorrectionOutcome {
            text: current,
            rules_applied: applied,
            warnings: set.warnings.clone(),
        }
    }

    /// Drop the cached rules for one context (called after any mutation).
    pub fn invalidate(&self, name: &str) {
        let _ = self.cache.write().remove(name);
    }

    /// Drop every cached rule set (called after a store reload).
    pub fn invalidate_all(&self) {
        self.cache.write().clear();
    }

    /// Whether a compiled set is currently cached for `name`.
    #[must_use]
    pub fn is_cached(&self, name: &str) -> bool {
        self.cache.read().contains_key(name)
    }

    fn rules_for(&self, name: &str, doc: &ContextDocument) -> Arc<CompiledRuleSet> {
        if let Some(set) = self.cache.read().get(name) {
            return Arc::clone(set);
        }
        let set = Arc::new(CompiledRuleSet::from_document(doc));
        let _ = self
            .cache
            .write()
            .insert(name.to_string(), Arc::clone(&set));
        set
    }
}

impl std::fmt::Debug for CorrectionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CorrectionEngine")
            .field("cached_contexts", &self.cache.read().len())
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn make_doc(auto_convert: bool, corrections: serde_json::Value) -> ContextDocument {
        serde_json::from_value(json!({
            "tool_category": "dokuwiki",
            "description": "wiki markup fixes",
            "auto_convert": auto_convert,
            "auto_corrections": corrections,
        }))
        .unwrap()
    }

    // -- Basic application --

    #[test]
    fn markdown_header_to_wiki_header() {
        let doc = make_doc(
            true,
            json!({
                "fix_header": {"pattern": "^#\\s*(.+)$", "replacement": "====== $1 ======"}
            }),
        );
        let engine = CorrectionEngine::new();
        let outcome = engine.apply("wiki", &doc, "# Title");
        assert_eq!(outcome.text, "====== Title ======");
        assert_eq!(outcome.rules_applied, 1);
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn anchors_match_every_line() {
        let doc = make_doc(
            true,
            json!({
                "fix_header": {"pattern": "^#\\s*(.+)$", "replacement": "====== $1 ======"}
            }),
        );
        let engine = CorrectionEngine::new();
        let outcome = engine.apply("wiki", &doc, "# One\nbody\n# Two");
        assert_eq!(outcome.text, "====== One ======\nbody\n====== Two ======");
    }

    #[test]
    fn all_non_overlapping_matches_replaced() {
        let doc = make_doc(
            true,
            json!({"dashes": {"pattern": "--", "replacement": "—"}}),
        );
        let engine = CorrectionEngine::new();
        let outcome = engine.apply("typo", &doc, "a -- b -- c");
        assert_eq!(outcome.text, "a — b — c");
    }

    #[test]
    fn later_rules_see_earlier_output() {
        let doc = make_doc(
            true,
            json!({
                "first": {"pattern": "foo", "replacement": "bar"},
                "second": {"pattern": "bar", "replacement": "baz"}
            }),
        );
        let engine = CorrectionEngine::new();
        let outcome = engine.apply("chain", &doc, "foo");
        assert_eq!(outcome.text, "baz");
        assert_eq!(outcome.rules_applied, 2);
    }

    #[test]
    fn numbered_backreferences() {
        let doc = make_doc(
            true,
            json!({"swap": {"pattern": "(\\w+)=(\\w+)", "replacement": "$2=$1"}}),
        );
        let engine = CorrectionEngine::new();
        let outcome = engine.apply("cfg", &doc, "key=value");
        assert_eq!(outcome.text, "value=key");
    }

    // -- Identity cases --

    #[test]
    fn auto_convert_false_is_identity() {
        let doc = make_doc(
            false,
            json!({"fix": {"pattern": "a", "replacement": "b"}}),
        );
        let engine = CorrectionEngine::new();
        let outcome = engine.apply("off", &doc, "aaa");
        assert_eq!(outcome.text, "aaa");
        assert_eq!(outcome.rules_applied, 0);
    }

    #[test]
    fn no_rules_is_identity() {
        let doc = make_doc(true, json!({}));
        let engine = CorrectionEngine::new();
        let outcome = engine.apply("empty", &doc, "text");
        assert_eq!(outcome.text, "text");
        assert_eq!(outcome.rules_applied, 0);
    }

    #[test]
    fn non_matching_rule_counts_nothing() {
        let doc = make_doc(
            true,
            json!({"fix": {"pattern": "zzz", "replacement": "y"}}),
        );
        let engine = CorrectionEngine::new();
        let outcome = engine.apply("miss", &doc, "abc");
        assert_eq!(outcome.text, "abc");
        assert_eq!(outcome.rules_applied, 0);
    }

    // -- Broken rules --

    #[test]
    fn bad_pattern_skipped_others_apply() {
        let doc = make_doc(
            true,
            json!({
                "broken": {"pattern": "([unclosed", "replacement": "x"},
                "works": {"pattern": "b", "replacement": "B"}
            }),
        );
        let engine = CorrectionEngine::new();
        let outcome = engine.apply("mixed", &doc, "abc");
        assert_eq!(outcome.text, "aBc");
        assert_eq!(outcome.rules_applied, 1);
        assert_eq!(outcome.warnings.len(), 1);
        assert!(outcome.warnings[0].contains("broken"));
    }

    #[test]
    fn malformed_entry_skipped() {
        let doc = make_doc(
            true,
            json!({
                "not_a_rule": "just a string",
                "works": {"pattern": "a", "replacement": "A"}
            }),
        );
        let engine = CorrectionEngine::new();
        let outcome = engine.apply("mixed", &doc, "abc");
        assert_eq!(outcome.text, "Abc");
        assert_eq!(outcome.warnings.len(), 1);
        assert!(outcome.warnings[0].contains("not_a_rule"));
    }

    // -- Cache behavior --

    #[test]
    fn apply_populates_cache_and_invalidate_drops_it() {
        let doc = make_doc(
            true,
            json!({"fix": {"pattern": "a", "replacement": "b"}}),
        );
        let engine = CorrectionEngine::new();
        assert!(!engine.is_cached("wiki"));

        let _ = engine.apply("wiki", &doc, "a");
        assert!(engine.is_cached("wiki"));

        engine.invalidate("wiki");
        assert!(!engine.is_cached("wiki"));
    }

    #[test]
    fn invalidate_all_clears_every_entry() {
        let doc = make_doc(
            true,
            json!({"fix": {"pattern": "a", "replacement": "b"}}),
        );
        let engine = CorrectionEngine::new();
        let _ = engine.apply("one", &doc, "a");
        let _ = engine.apply("two", &doc, "a");
        engine.invalidate_all();
        assert!(!engine.is_cached("one"));
        assert!(!engine.is_cached("two"));
    }

    #[test]
    fn stale_cache_refreshes_after_invalidate() {
        let old = make_doc(
            true,
            json!({"fix": {"pattern": "a", "replacement": "OLD"}}),
        );
        let new = make_doc(
            true,
            json!({"fix": {"pattern": "a", "replacement": "NEW"}}),
        );
        let engine = CorrectionEngine::new();
        assert_eq!(engine.apply("wiki", &old, "a").text, "OLD");
        // Without invalidation the stale compiled set still answers.
        assert_eq!(engine.apply("wiki", &new, "a").text, "OLD");
        engine.invalidate("wiki");
        assert_eq!(engine.apply("wiki", &new, "a").text, "NEW");
    }

    #[test]
    fn auto_convert_false_does_not_populate_cache() {
        let doc = make_doc(
            false,
            json!({"fix": {"pattern": "a", "replacement": "b"}}),
        );
        let engine = CorrectionEngine::new();
        let _ = engine.apply("off", &doc, "a");
        assert!(!engine.is_cached("off"));
    }
}
