//! Candidate extraction from tool invocations.
//!
//! Everything here is pure: a decoded [`ToolCall`] plus result text maps to
//! zero or more short lookup keys. No I/O, no hidden state.

pub mod extensions;
mod shell;

pub use extensions::CodeExtensions;

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::event::ToolEvent;
use extensions::{basename, strip_extension};

pub const MIN_CANDIDATE_LEN: usize = 3;
pub const MAX_CANDIDATE_LEN: usize = 200;

const REGEX_METACHARS: &[char] = &[
    '\\', '^', '$', '.', '*', '+', '?', '(', ')', '[', ']', '{', '}', '|',
];
const GLOB_CHARS: &[char] = &['*', '?', '[', ']', '{', '}'];
const QUOTE_CHARS: &[char] = &['"', '\'', '`'];

/// Escape classes like `\b`, `\s`, `\w` go as a unit, not just their backslash.
static ESCAPE_CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\[A-Za-z]").expect("escape class pattern should compile"));

/// `path:line:` at the start of a search result line.
static RESULT_LOCATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([^\s:]+):(\d+):").expect("result location pattern should compile")
});

/// Tool shapes the extractor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    Grep,
    Find,
    Bash,
    Read,
    ReadMany,
}

impl ToolKind {
    /// Map a host tool name to a known shape. Case-insensitive.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "grep" | "search" => Some(Self::Grep),
            "find" | "glob" => Some(Self::Find),
            "bash" | "shell" => Some(Self::Bash),
            "read" => Some(Self::Read),
            "read_many" | "readmany" | "multi_read" => Some(Self::ReadMany),
            _ => None,
        }
    }

    /// Tools whose output carries `path:line:` locations.
    pub fn scans_results(self) -> bool {
        matches!(self, Self::Grep | Self::Bash)
    }
}

/// A tool invocation decoded into the fields extraction needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolCall {
    Grep { pattern: String },
    Find { glob: String },
    Bash { command: String },
    Read { path: String },
    /// `None` when the input has no `files` list; result text is scanned instead.
    ReadMany { paths: Option<Vec<String>> },
}

impl ToolCall {
    /// Decode the input of a known tool shape. Missing required fields yield `None`.
    pub fn decode(kind: ToolKind, input: &Map<String, Value>) -> Option<Self> {
        match kind {
            ToolKind::Grep => str_field(input, &["pattern", "query"]).map(|pattern| Self::Grep {
                pattern: pattern.to_string(),
            }),
            ToolKind::Find => str_field(input, &["pattern", "glob", "path"]).map(|glob| {
                Self::Find {
                    glob: glob.to_string(),
                }
            }),
            ToolKind::Bash => str_field(input, &["command"]).map(|command| Self::Bash {
                command: command.to_string(),
            }),
            ToolKind::Read => str_field(input, &["path", "file_path"]).map(|path| Self::Read {
                path: path.to_string(),
            }),
            ToolKind::ReadMany => Some(Self::ReadMany {
                paths: input.get("files").and_then(Value::as_array).map(|files| {
                    files
                        .iter()
                        .filter_map(|f| f.get("path").and_then(Value::as_str))
                        .map(String::from)
                        .collect()
                }),
            }),
        }
    }

    pub fn from_event(event: &ToolEvent) -> Option<Self> {
        ToolKind::from_name(&event.tool_name).and_then(|kind| Self::decode(kind, &event.input))
    }

    pub fn kind(&self) -> ToolKind {
        match self {
            Self::Grep { .. } => ToolKind::Grep,
            Self::Find { .. } => ToolKind::Find,
            Self::Bash { .. } => ToolKind::Bash,
            Self::Read { .. } => ToolKind::Read,
            Self::ReadMany { .. } => ToolKind::ReadMany,
        }
    }
}

fn str_field<'a>(input: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .find_map(|key| input.get(*key).and_then(Value::as_str))
}

/// Maps tool calls to lookup candidates.
#[derive(Debug, Clone, Default)]
pub struct Extractor {
    extensions: CodeExtensions,
}

impl Extractor {
    pub fn new(extensions: CodeExtensions) -> Self {
        Self { extensions }
    }

    /// The primary candidate for a call, if any.
    pub fn extract(&self, call: &ToolCall) -> Option<String> {
        match call {
            ToolCall::Grep { pattern } => finalize(&strip_regex(&strip_quotes(pattern))),
            ToolCall::Find { glob } => finalize(&strip_glob(strip_extension(basename(glob)))),
            ToolCall::Bash { command } => shell::scan(command, &self.extensions),
            ToolCall::Read { path } => self.code_stem(path),
            ToolCall::ReadMany { .. } => None,
        }
    }

    /// Filename stems from `path:line:` result lines, first occurrences only.
    pub fn extract_secondary(&self, result_text: &str, limit: usize) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for line in result_text.lines() {
            if out.len() >= limit {
                break;
            }
            let Some(caps) = RESULT_LOCATION.captures(line) else {
                continue;
            };
            let Some(stem) = finalize(strip_extension(basename(&caps[1]))) else {
                continue;
            };
            if seen.insert(stem.clone()) {
                out.push(stem);
            }
        }
        out
    }

    /// `(path, candidate)` pairs for a multi-file read, unique by candidate, at most `limit`.
    pub fn extract_batch(
        &self,
        call: &ToolCall,
        result_text: &str,
        limit: usize,
    ) -> Vec<(String, String)> {
        let paths = match call {
            ToolCall::ReadMany { paths: Some(paths) } => paths.clone(),
            ToolCall::ReadMany { paths: None } => result_text
                .lines()
                .filter_map(|line| line.trim().strip_prefix('@'))
                .map(str::trim)
                .filter(|path| !path.is_empty())
                .map(String::from)
                .collect(),
            _ => return Vec::new(),
        };

        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for path in paths {
            if out.len() >= limit {
                break;
            }
            let Some(stem) = self.code_stem(&path) else {
                continue;
            };
            if seen.insert(stem.clone()) {
                out.push((path, stem));
            }
        }
        out
    }

    fn code_stem(&self, path: &str) -> Option<String> {
        if !self.extensions.is_code_path(path) {
            return None;
        }
        finalize(strip_extension(basename(path)))
    }
}

pub(crate) fn strip_quotes(s: &str) -> String {
    s.chars().filter(|c| !QUOTE_CHARS.contains(c)).collect()
}

pub(crate) fn strip_regex(s: &str) -> String {
    ESCAPE_CLASS
        .replace_all(s, "")
        .chars()
        .filter(|c| !REGEX_METACHARS.contains(c))
        .collect()
}

pub(crate) fn strip_glob(s: &str) -> String {
    s.chars().filter(|c| !GLOB_CHARS.contains(c)).collect()
}

/// Trim and validate a derived candidate.
pub(crate) fn finalize(s: &str) -> Option<String> {
    let s = s.trim();
    let len = s.chars().count();
    if !(MIN_CANDIDATE_LEN..=MAX_CANDIDATE_LEN).contains(&len) || s.contains(['/', '\\']) {
        return None;
    }
    Some(s.to_string())
}
