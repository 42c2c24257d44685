//! Integration tests for the augmentation orchestrator with a recording lookup.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tempfile::TempDir;

use graph_hook::augment::{AugmentLimits, Augmenter};
use graph_hook::event::{ContentBlock, ToolEvent};
use graph_hook::invoke::PatternLookup;

/// Answers from a fixed table and records every pattern it is asked for.
#[derive(Default)]
struct RecordingLookup {
    answers: HashMap<String, String>,
    /// Per-pattern delay, to shuffle completion order.
    delays: HashMap<String, u64>,
    calls: Mutex<Vec<String>>,
}

impl RecordingLookup {
    fn answering(pairs: &[(&str, &str)]) -> Self {
        Self {
            answers: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            ..Default::default()
        }
    }

    fn with_delay(mut self, pattern: &str, millis: u64) -> Self {
        self.delays.insert(pattern.to_string(), millis);
        self
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PatternLookup for RecordingLookup {
    async fn lookup(&self, pattern: &str, _cwd: &Path) -> Option<String> {
        self.calls.lock().unwrap().push(pattern.to_string());
        if let Some(ms) = self.delays.get(pattern) {
            tokio::time::sleep(Duration::from_millis(*ms)).await;
        }
        self.answers.get(pattern).cloned()
    }

    fn name(&self) -> &str {
        "recording"
    }
}

fn indexed_dir() -> TempDir {
    let tmp = TempDir::new().unwrap();
    std::fs::create_dir(tmp.path().join(".gitnexus")).unwrap();
    tmp
}

fn last_text(event: &ToolEvent) -> String {
    event
        .content
        .last()
        .and_then(|b| b.text.clone())
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// End-to-end scenarios
// ---------------------------------------------------------------------------

#[tokio::test]
async fn grep_event_dispatches_stripped_pattern() {
    let tmp = indexed_dir();
    let lookup = Arc::new(RecordingLookup::answering(&[("withdraw", "withdraw -> Vault")]));
    let mut augmenter = Augmenter::new(lookup.clone(), tmp.path());

    let event = ToolEvent::new("grep", json!({"pattern": "\\bwithdraw\\s*\\("}));
    let augmented = augmenter.on_tool_result(&event).await.unwrap();

    assert_eq!(lookup.calls(), vec!["withdraw".to_string()]);
    assert_eq!(
        last_text(&augmented),
        "[graph context: withdraw]\nwithdraw -> Vault"
    );
}

#[tokio::test]
async fn multi_file_read_looks_up_each_unique_file_once() {
    let tmp = indexed_dir();
    let lookup = Arc::new(RecordingLookup::answering(&[("a", "ctx a"), ("b", "ctx b")]));
    let mut augmenter = Augmenter::new(lookup.clone(), tmp.path());

    let event = ToolEvent::new(
        "read_many",
        json!({"files": [{"path": "a.sol"}, {"path": "b.sol"}, {"path": "a.sol"}]}),
    );
    let augmented = augmenter.on_tool_result(&event).await.unwrap();

    let mut calls = lookup.calls();
    calls.sort();
    assert_eq!(calls, vec!["a".to_string(), "b".to_string()]);
    assert_eq!(
        last_text(&augmented),
        "[graph context: 2 files]\n\n### a.sol\nctx a\n\n### b.sol\nctx b"
    );
}

#[tokio::test]
async fn unrecognized_extension_returns_no_change() {
    let tmp = indexed_dir();
    let lookup = Arc::new(RecordingLookup::default());
    let mut augmenter = Augmenter::new(lookup.clone(), tmp.path());

    let event = ToolEvent::new("read", json!({"path": "notes.txt"}));
    assert!(augmenter.on_tool_result(&event).await.is_none());
    assert!(lookup.calls().is_empty());
}

#[tokio::test]
async fn missing_index_returns_no_change_without_lookups() {
    let tmp = TempDir::new().unwrap();
    let lookup = Arc::new(RecordingLookup::answering(&[("withdraw", "ctx")]));
    let mut augmenter = Augmenter::new(lookup.clone(), tmp.path());

    let event = ToolEvent::new("grep", json!({"pattern": "withdraw"}));
    assert!(augmenter.on_tool_result(&event).await.is_none());
    assert!(lookup.calls().is_empty());
    // Still counted as a fire.
    assert_eq!(augmenter.stats().hook_fire_count, 1);
    assert_eq!(augmenter.stats().hit_count, 0);
}

// ---------------------------------------------------------------------------
// Dedup and counters
// ---------------------------------------------------------------------------

#[tokio::test]
async fn repeated_event_is_fully_suppressed() {
    let tmp = indexed_dir();
    let lookup = Arc::new(RecordingLookup::answering(&[
        ("withdraw", "ctx"),
        ("vault", "file ctx"),
    ]));
    let mut augmenter = Augmenter::new(lookup.clone(), tmp.path());

    let event = ToolEvent::new("grep", json!({"pattern": "withdraw"}))
        .with_output("src/vault.rs:10:fn withdraw()");

    assert!(augmenter.on_tool_result(&event).await.is_some());
    assert!(augmenter.on_tool_result(&event).await.is_none());

    assert_eq!(lookup.calls(), vec!["withdraw".to_string(), "vault".to_string()]);
    let stats = augmenter.stats();
    assert_eq!(stats.hook_fire_count, 2);
    assert_eq!(stats.hit_count, 1);
    assert_eq!(stats.dedup_entries, 2);
    assert_eq!(stats.suppressed_lookups, 2);
}

#[tokio::test]
async fn candidates_are_marked_seen_even_when_lookups_are_empty() {
    let tmp = indexed_dir();
    let lookup = Arc::new(RecordingLookup::default());
    let mut augmenter = Augmenter::new(lookup.clone(), tmp.path());

    let event = ToolEvent::new("grep", json!({"pattern": "nothingHere"}));
    assert!(augmenter.on_tool_result(&event).await.is_none());
    assert!(augmenter.on_tool_result(&event).await.is_none());
    assert_eq!(lookup.calls().len(), 1);
    assert_eq!(augmenter.stats().hit_count, 0);
}

#[tokio::test]
async fn fan_out_is_capped() {
    let tmp = indexed_dir();
    let lookup = Arc::new(RecordingLookup::default());
    let mut augmenter = Augmenter::new(lookup.clone(), tmp.path()).with_limits(AugmentLimits {
        max_patterns: 2,
        batch_limit: 5,
        secondary_limit: 2,
    });

    let event = ToolEvent::new("grep", json!({"pattern": "render"}))
        .with_output("src/a.ts:1:render\nsrc/b.ts:2:render\nsrc/c.ts:3:render");
    augmenter.on_tool_result(&event).await;

    assert_eq!(lookup.calls(), vec!["render".to_string(), "a".to_string()]);
}

// ---------------------------------------------------------------------------
// Merge order and formatting
// ---------------------------------------------------------------------------

#[tokio::test]
async fn results_merge_in_dispatch_order() {
    let tmp = indexed_dir();
    let lookup = Arc::new(
        RecordingLookup::answering(&[("render", "first"), ("View", "second")])
            .with_delay("render", 50),
    );
    let mut augmenter = Augmenter::new(lookup, tmp.path());

    let event = ToolEvent::new("grep", json!({"pattern": "render"}))
        .with_output("src/View.tsx:4:render()");
    let augmented = augmenter.on_tool_result(&event).await.unwrap();

    assert_eq!(
        last_text(&augmented),
        "[graph context: render, View]\nfirst\n\nsecond"
    );
}

#[tokio::test]
async fn single_file_batch_is_labelled_by_name() {
    let tmp = indexed_dir();
    let lookup = Arc::new(RecordingLookup::answering(&[("Pool", "pool ctx")]));
    let mut augmenter = Augmenter::new(lookup, tmp.path());

    let event = ToolEvent::new(
        "read_many",
        json!({"files": [{"path": "contracts/Pool.sol"}, {"path": "contracts/Math.sol"}]}),
    );
    let augmented = augmenter.on_tool_result(&event).await.unwrap();
    assert_eq!(last_text(&augmented), "[graph context: Pool.sol]\npool ctx");
}

#[tokio::test]
async fn augmentation_is_append_only() {
    let tmp = indexed_dir();
    let lookup = Arc::new(RecordingLookup::answering(&[("Engine", "ctx")]));
    let mut augmenter = Augmenter::new(lookup, tmp.path());

    let mut event = ToolEvent::new("read", json!({"path": "lib/Engine.rb"}));
    event.content = vec![
        ContentBlock::text("line one"),
        ContentBlock {
            kind: "image".into(),
            text: None,
        },
    ];
    let augmented = augmenter.on_tool_result(&event).await.unwrap();

    assert_eq!(augmented.content.len(), 3);
    assert_eq!(&augmented.content[..2], &event.content[..]);
    assert_eq!(augmented.tool_name, event.tool_name);
    assert_eq!(augmented.input, event.input);
}

// ---------------------------------------------------------------------------
// Toggle and session reset
// ---------------------------------------------------------------------------

#[tokio::test]
async fn disabled_session_does_nothing_and_counts_nothing() {
    let tmp = indexed_dir();
    let lookup = Arc::new(RecordingLookup::answering(&[("withdraw", "ctx")]));
    let mut augmenter = Augmenter::new(lookup.clone(), tmp.path());

    assert!(!augmenter.toggle());
    let event = ToolEvent::new("grep", json!({"pattern": "withdraw"}));
    assert!(augmenter.on_tool_result(&event).await.is_none());
    assert_eq!(augmenter.stats().hook_fire_count, 0);
    assert!(lookup.calls().is_empty());
}

#[tokio::test]
async fn unknown_tool_is_not_a_fire() {
    let tmp = indexed_dir();
    let lookup = Arc::new(RecordingLookup::default());
    let mut augmenter = Augmenter::new(lookup, tmp.path());

    let event = ToolEvent::new("write", json!({"path": "src/lib.rs"}));
    assert!(augmenter.on_tool_result(&event).await.is_none());
    assert_eq!(augmenter.stats().hook_fire_count, 0);
}

#[tokio::test]
async fn reset_clears_state_and_reenables() {
    let tmp = indexed_dir();
    let other = indexed_dir();
    let lookup = Arc::new(RecordingLookup::answering(&[("withdraw", "ctx")]));
    let mut augmenter = Augmenter::new(lookup.clone(), tmp.path());

    let event = ToolEvent::new("grep", json!({"pattern": "withdraw"}));
    assert!(augmenter.on_tool_result(&event).await.is_some());
    augmenter.set_enabled(false);

    augmenter.reset(other.path());
    let stats = augmenter.stats();
    assert!(stats.augment_enabled);
    assert_eq!(stats.hook_fire_count, 0);
    assert_eq!(stats.hit_count, 0);
    assert_eq!(stats.dedup_entries, 0);
    assert_eq!(stats.working_directory, other.path());

    // Same candidate is looked up again in the new session.
    assert!(augmenter.on_tool_result(&event).await.is_some());
    assert_eq!(lookup.calls().len(), 2);
}
