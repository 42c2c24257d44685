//! Integration tests for candidate extraction across tool shapes.

use serde_json::json;

use graph_hook::event::ToolEvent;
use graph_hook::extract::{CodeExtensions, Extractor, ToolCall, ToolKind};

fn extractor() -> Extractor {
    Extractor::default()
}

fn call(tool: &str, input: serde_json::Value) -> ToolCall {
    ToolCall::from_event(&ToolEvent::new(tool, input)).unwrap()
}

// ---------------------------------------------------------------------------
// Tool decoding
// ---------------------------------------------------------------------------

#[test]
fn tool_names_are_case_insensitive_with_aliases() {
    assert_eq!(ToolKind::from_name("Grep"), Some(ToolKind::Grep));
    assert_eq!(ToolKind::from_name("search"), Some(ToolKind::Grep));
    assert_eq!(ToolKind::from_name("GLOB"), Some(ToolKind::Find));
    assert_eq!(ToolKind::from_name("shell"), Some(ToolKind::Bash));
    assert_eq!(ToolKind::from_name("read_many"), Some(ToolKind::ReadMany));
    assert_eq!(ToolKind::from_name("write"), None);
}

#[test]
fn missing_required_field_decodes_to_none() {
    let event = ToolEvent::new("grep", json!({"path": "src"}));
    assert_eq!(ToolCall::from_event(&event), None);

    let event = ToolEvent::new("read", json!({"file_path": "src/lib.rs"}));
    assert_eq!(
        ToolCall::from_event(&event),
        Some(ToolCall::Read {
            path: "src/lib.rs".into()
        })
    );
}

#[test]
fn read_many_without_files_list_decodes() {
    let event = ToolEvent::new("read_many", json!({}));
    assert_eq!(
        ToolCall::from_event(&event),
        Some(ToolCall::ReadMany { paths: None })
    );
}

// ---------------------------------------------------------------------------
// Primary extraction
// ---------------------------------------------------------------------------

#[test]
fn grep_escape_classes_and_metachars_are_stripped() {
    let c = call("grep", json!({"pattern": "\\bwithdraw\\s*\\("}));
    assert_eq!(extractor().extract(&c), Some("withdraw".into()));
}

#[test]
fn shell_grep_plain_expression_is_unchanged() {
    for expr in ["transferFrom", "parse_config", "abc", "MAX_RETRIES"] {
        let c = call("bash", json!({"command": format!("grep -rn {expr} src/")}));
        assert_eq!(extractor().extract(&c), Some(expr.to_string()), "expr {expr}");
    }
}

#[test]
fn shell_cat_yields_stem_only_for_code_extensions() {
    let c = call("bash", json!({"command": "cat path/to/File.go"}));
    assert_eq!(extractor().extract(&c), Some("File".into()));

    let c = call("bash", json!({"command": "cat path/to/File.log"}));
    assert_eq!(extractor().extract(&c), None);
}

#[test]
fn extra_extensions_are_recognized() {
    let ex = Extractor::new(CodeExtensions::new([".proto"]));
    let c = call("read", json!({"path": "api/Orders.PROTO"}));
    assert_eq!(ex.extract(&c), Some("Orders".into()));
}

#[test]
fn find_glob_reduces_to_name() {
    let c = call("find", json!({"pattern": "**/*Repository.java"}));
    assert_eq!(extractor().extract(&c), Some("Repository".into()));
}

#[test]
fn read_of_unrecognized_extension_yields_none() {
    let c = call("read", json!({"path": "notes.txt"}));
    assert_eq!(extractor().extract(&c), None);
}

#[test]
fn candidates_out_of_bounds_are_dropped() {
    let c = call("grep", json!({"pattern": "ab"}));
    assert_eq!(extractor().extract(&c), None);

    let long = "x".repeat(201);
    let c = call("grep", json!({"pattern": long}));
    assert_eq!(extractor().extract(&c), None);

    let exact = "y".repeat(200);
    let c = call("grep", json!({"pattern": exact.clone()}));
    assert_eq!(extractor().extract(&c), Some(exact));
}

#[test]
fn grep_with_path_separator_is_dropped() {
    let c = call("grep", json!({"pattern": "src/auth"}));
    assert_eq!(extractor().extract(&c), None);
}

#[test]
fn quotes_are_removed() {
    let c = call("grep", json!({"pattern": "\"handleLogin\""}));
    assert_eq!(extractor().extract(&c), Some("handleLogin".into()));
}

// ---------------------------------------------------------------------------
// Secondary and batch extraction
// ---------------------------------------------------------------------------

#[test]
fn secondary_candidates_come_from_result_locations() {
    let text = "src/vault.rs:12:fn withdraw()\n\
                src/vault.rs:40:    withdraw(x)\n\
                src/bank/Ledger.ts:7:withdraw\n\
                src/other.py:3:withdraw\n\
                no location here";
    assert_eq!(
        extractor().extract_secondary(text, 2),
        vec!["vault".to_string(), "Ledger".to_string()]
    );
}

#[test]
fn batch_dedups_by_stem_and_keeps_order() {
    let c = call(
        "read_many",
        json!({"files": [{"path": "a.sol"}, {"path": "b.sol"}, {"path": "a.sol"}]}),
    );
    assert_eq!(
        extractor().extract_batch(&c, "", 5),
        vec![
            ("a.sol".to_string(), "a".to_string()),
            ("b.sol".to_string(), "b".to_string())
        ]
    );
}

#[test]
fn batch_respects_limit_and_skips_non_code() {
    let files: Vec<_> = ["one.rs", "README.md", "two.rs", "three.rs", "four.rs", "five.rs", "six.rs"]
        .iter()
        .map(|p| json!({"path": p}))
        .collect();
    let c = call("read_many", json!({ "files": files }));
    let pairs = extractor().extract_batch(&c, "", 5);
    let stems: Vec<_> = pairs.iter().map(|(_, s)| s.as_str()).collect();
    assert_eq!(stems, vec!["one", "two", "three", "four", "five"]);
}

#[test]
fn batch_falls_back_to_at_lines_in_result() {
    let c = call("read_many", json!({}));
    let text = "@src/Pool.sol\ncontents\n  @ lib/Math.sol\n@notes.txt";
    let stems: Vec<_> = extractor()
        .extract_batch(&c, text, 5)
        .into_iter()
        .map(|(_, s)| s)
        .collect();
    assert_eq!(stems, vec!["Pool".to_string(), "Math".to_string()]);
}

// ---------------------------------------------------------------------------
// Purity
// ---------------------------------------------------------------------------

#[test]
fn extraction_is_idempotent() {
    let ex = extractor();
    let events = [
        call("grep", json!({"pattern": "fn\\s+parse_.*"})),
        call("bash", json!({"command": "find . -name '*Router.ts'"})),
        call("read", json!({"path": "lib/engine.rb"})),
    ];
    for c in &events {
        assert_eq!(ex.extract(c), ex.extract(c));
    }
    let text = "a/x.rs:1:y\nb/z.rs:2:w";
    assert_eq!(ex.extract_secondary(text, 2), ex.extract_secondary(text, 2));
}
