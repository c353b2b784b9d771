//! Name and document validation.
//!
//! Both checks gate every mutation and must pass before the backup manager
//! or the store are touched. Each returns every violation found, not just
//! the first, so callers can report a complete diagnostic.

use std::sync::LazyLock;

use regex::Regex;

use lore_core::constants::{MAX_CONTEXT_NAME_LEN, RESERVED_CONTEXT_NAMES};
use lore_core::types::{ContextDocument, CorrectionRule, PatternSection, TriggerRule};

static NAME_CHARSET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("^[A-Za-z0-9_-]+$").unwrap());

/// Check a candidate context name. Pure function, no side effects.
#[must_use]
pub fn validate_name(name: &str) -> Vec<String> {
    let mut violations = Vec::new();

    if name.is_empty() {
        violations.push("name must not be empty".to_string());
    } else {
        if name.chars().count() > MAX_CONTEXT_NAME_LEN {
            violations.push(format!("name exceeds {MAX_CONTEXT_NAME_LEN} characters"));
        }
        if !NAME_CHARSET.is_match(name) {
            violations.push(
                "name may only contain letters, digits, underscores, and hyphens".to_string(),
            );
        }
    }
    if RESERVED_CONTEXT_NAMES.contains(&name) {
        violations.push(format!("name `{name}` is reserved"));
    }

    violations
}

/// Check a candidate document body.
///
/// A single invalid auto-correction rule fails the whole document; there is
/// no partial acceptance at write time. (Apply-time skipping in the pattern
/// engine covers files hand-edited after the fact.)
#[must_use]
pub fn validate_document(doc: &ContextDocument) -> Vec<String> {
    let mut violations = Vec::new();

    if doc.tool_category.trim().is_empty() {
        violations.push("tool_category must be a non-empty string".to_string());
    }
    if doc.description.trim().is_empty() {
        violations.push("description must be a non-empty string".to_string());
    }

    for (rule_name, value) in &doc.auto_corrections {
        match serde_json::from_value::<CorrectionRule>(value.clone()) {
            Ok(rule) => {
                if let Err(e) = Regex::new(&rule.pattern) {
                    violations.push(format!(
                        "auto_corrections.{rule_name}: pattern does not compile: {e}"
                    ));
                }
            }
            Err(_) => violations.push(format!(
                "auto_corrections.{rule_name}: must carry `pattern` and `replacement` strings"
            )),
        }
    }

    for section in [
        PatternSection::AutoStoreTriggers,
        PatternSection::AutoRetrieveTriggers,
    ] {
        for (trigger_name, value) in doc.section(section) {
            if serde_json::from_value::<TriggerRule>(value.clone()).is_err() {
                violations.push(format!("{section}.{trigger_name}: must carry a `patterns` list"));
            }
        }
    }

    if let Some(version) = &doc.metadata.version {
        if !is_three_part_version(version) {
            violations.push(format!(
                "metadata.version `{version}` must be MAJOR.MINOR.PATCH"
            ));
        }
    }

    violations
}

/// Exactly three dot-separated numeric components.
fn is_three_part_version(version: &str) -> bool {
    let mut parts = 0;
    for part in version.split('.') {
        parts += 1;
        if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
            return false;
        }
    }
    parts == 3
}
