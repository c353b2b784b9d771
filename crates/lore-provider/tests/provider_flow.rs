#![allow(missing_docs, unused_results)]

//! End-to-end flows through a [`ContextProvider`] backed by a real context
//! directory and the in-process memory backend.

use std::fs;
use std::path::Path;

use serde_json::json;

use lore_core::errors::ContextError;
use lore_core::types::{PatternSection, SectionUpdate};
use lore_provider::ContextProvider;
use lore_settings::{ContextsSettings, LoreSettings};

fn setup_provider() -> (tempfile::TempDir, ContextProvider) {
    let tmp = tempfile::tempdir().unwrap();
    let settings = LoreSettings {
        contexts: ContextsSettings {
            dir: tmp.path().display().to_string(),
            auto_load: true,
        },
        ..LoreSettings::default()
    };
    let provider = ContextProvider::new(settings).unwrap();
    (tmp, provider)
}

fn seed_context(dir: &Path, name: &str, body: &serde_json::Value) {
    fs::write(
        dir.join(format!("{name}_context.json")),
        serde_json::to_string_pretty(body).unwrap(),
    )
    .unwrap();
}

fn basic_body(description: &str) -> SectionUpdate {
    SectionUpdate {
        description: Some(description.to_string()),
        ..SectionUpdate::default()
    }
}

fn rule_entries(value: serde_json::Value) -> serde_json::Map<String, serde_json::Value> {
    value.as_object().cloned().unwrap()
}

fn backup_files(dir: &Path) -> Vec<String> {
    let backups = dir.join("backups");
    if !backups.exists() {
        return Vec::new();
    }
    let mut names: Vec<String> = fs::read_dir(backups)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn discovery_counts_valid_and_malformed() {
    let (tmp, provider) = setup_provider();
    seed_context(
        tmp.path(),
        "git",
        &json!({"tool_category": "git", "description": "Git conventions"}),
    );
    fs::write(tmp.path().join("broken_context.json"), "{not json").unwrap();

    let report = provider.discover_and_load();
    assert_eq!(report.loaded, 1);
    assert_eq!(report.skipped_count(), 1);
    assert_eq!(provider.list_contexts(), ["git"]);
}

#[test]
fn wiki_headers_rewritten_when_conversion_enabled() {
    let (tmp, provider) = setup_provider();
    seed_context(
        tmp.path(),
        "dokuwiki",
        &json!({
            "tool_category": "dokuwiki",
            "description": "Wiki markup conventions",
            "auto_convert": true,
            "auto_corrections": {
                "fix_header": {"pattern": "^#\\s*(.+)$", "replacement": "====== $1 ======"}
            }
        }),
    );
    provider.discover_and_load();

    let outcome = provider.apply_corrections("dokuwiki:core_savePage", "# Title");
    assert_eq!(outcome.text, "====== Title ======");
    assert_eq!(outcome.rules_applied, 1);
    assert!(outcome.warnings.is_empty());
}

#[test]
fn conversion_disabled_is_identity() {
    let (tmp, provider) = setup_provider();
    seed_context(
        tmp.path(),
        "dokuwiki",
        &json!({
            "tool_category": "dokuwiki",
            "description": "Wiki markup conventions",
            "auto_convert": false,
            "auto_corrections": {
                "fix_header": {"pattern": "^#\\s*(.+)$", "replacement": "====== $1 ======"}
            }
        }),
    );
    provider.discover_and_load();

    let outcome = provider.apply_corrections("dokuwiki", "# Title");
    assert_eq!(outcome.text, "# Title");
    assert_eq!(outcome.rules_applied, 0);
}

#[tokio::test]
async fn reserved_name_creates_nothing() {
    let (tmp, provider) = setup_provider();
    provider.discover_and_load();

    let err = provider
        .create_context("admin", "admin", &basic_body("Administration"))
        .await
        .unwrap_err();
    assert!(matches!(err, ContextError::NameInvalid { .. }));
    assert!(!tmp.path().join("admin_context.json").exists());
    assert!(provider.list_contexts().is_empty());
}

#[tokio::test]
async fn duplicate_pattern_rejected_second_time() {
    let (tmp, provider) = setup_provider();
    provider.discover_and_load();
    provider
        .create_context("git", "git", &basic_body("Git conventions"))
        .await
        .unwrap();

    let entries = rule_entries(json!({
        "fix_message": {"pattern": "^wip$", "replacement": "wip: describe the change"}
    }));
    provider
        .add_pattern("git", PatternSection::AutoCorrections, &entries)
        .await
        .unwrap();

    let err = provider
        .add_pattern("git", PatternSection::AutoCorrections, &entries)
        .await
        .unwrap_err();
    assert!(matches!(err, ContextError::DuplicateRule { .. }));

    // The first add survives, both in the store and on disk.
    let (_, doc) = provider.get_context("git").unwrap();
    assert!(doc.auto_corrections.contains_key("fix_message"));
    let raw = fs::read_to_string(tmp.path().join("git_context.json")).unwrap();
    assert!(raw.contains("fix_message"));
}

#[test]
fn unused_context_scores_zero() {
    let (tmp, provider) = setup_provider();
    seed_context(
        tmp.path(),
        "git",
        &json!({"tool_category": "git", "description": "Git conventions"}),
    );
    provider.discover_and_load();

    let report = provider.analyze_effectiveness("git").unwrap();
    assert!(report.score.abs() < f64::EPSILON);
    assert!(report.recommendations[0].contains("no observed usage"));
}

#[tokio::test]
async fn create_roundtrip_stamps_initial_usage() {
    let (_tmp, provider) = setup_provider();
    provider.discover_and_load();

    provider
        .create_context("git", "git", &basic_body("Git conventions"))
        .await
        .unwrap();

    let (name, doc) = provider.get_context("git").unwrap();
    assert_eq!(name, "git");
    assert_eq!(doc.metadata.version.as_deref(), Some("1.0.0"));
    assert_eq!(doc.metadata.usage.total_interactions, 1);
    assert_eq!(doc.metadata.usage.creation_count, 1);
    assert_eq!(doc.metadata.usage.update_count, 0);
    assert_eq!(doc.metadata.usage.pattern_additions, 0);
}

#[tokio::test]
async fn invalid_update_leaves_file_untouched() {
    let (tmp, provider) = setup_provider();
    provider.discover_and_load();
    provider
        .create_context("git", "git", &basic_body("Git conventions"))
        .await
        .unwrap();
    let path = tmp.path().join("git_context.json");
    let before = fs::read_to_string(&path).unwrap();

    let err = provider
        .update_context("git", &basic_body(""))
        .await
        .unwrap_err();
    assert!(matches!(err, ContextError::DocumentInvalid { .. }));
    assert_eq!(fs::read_to_string(&path).unwrap(), before);
    // No snapshot either: validation failed before the write phase.
    assert!(backup_files(tmp.path()).is_empty());
}

#[tokio::test]
async fn every_mutation_of_existing_file_adds_one_backup() {
    let (tmp, provider) = setup_provider();
    provider.discover_and_load();

    // Creation has no pre-image, so no backup.
    provider
        .create_context("git", "git", &basic_body("Git conventions"))
        .await
        .unwrap();
    assert!(backup_files(tmp.path()).is_empty());

    provider
        .update_context("git", &basic_body("Git conventions, revised"))
        .await
        .unwrap();
    assert_eq!(backup_files(tmp.path()).len(), 1);

    let entries = rule_entries(json!({
        "fix_message": {"pattern": "^wip$", "replacement": "wip: describe the change"}
    }));
    provider
        .add_pattern("git", PatternSection::AutoCorrections, &entries)
        .await
        .unwrap();
    let backups = backup_files(tmp.path());
    assert_eq!(backups.len(), 2);
    assert!(backups.iter().all(|n| n.starts_with("backup_git_")));
}

#[tokio::test]
async fn session_pass_retrieves_synopses_and_stores_insight() {
    let (tmp, provider) = setup_provider();
    seed_context(
        tmp.path(),
        "memory",
        &json!({
            "tool_category": "memory",
            "description": "Memory usage guidance",
            "session_initialization": {
                "enabled": true,
                "actions": {
                    "on_startup": [
                        {"action": "search_by_tag",
                         "parameters": {"tags": ["context-management"], "limit": 10}}
                    ]
                }
            }
        }),
    );
    provider.discover_and_load();

    // One mutation synopsis lands in memory before the session pass.
    provider
        .create_context("git", "git", &basic_body("Git conventions"))
        .await
        .unwrap();

    let status = provider.run_session_init().await;
    assert!(status.initialized);
    assert!(status.errors.is_empty());
    assert_eq!(status.executed_actions.len(), 1);
    assert_eq!(status.executed_actions[0].context, "memory");
    assert_eq!(status.executed_actions[0].action, "search_by_tag");
    assert_eq!(status.memory_retrieval_results, 1);
    assert!(!status.learning_insights.is_empty());

    // Synopsis plus the stored session insight.
    let stats = provider.memory_stats().await;
    assert_eq!(stats.total, 2);
}
