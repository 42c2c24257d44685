//! The five graph operations exposed to the host.
//!
//! Parameters are decoded per tool and validated before anything reaches the
//! backend. Every operation answers with text, an explicit "no results", or a
//! short rejection message; never a raw error.

pub mod paths;

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{GraphHookError, Result};
use crate::index::IndexLocator;
use crate::rpc::RpcTransport;

pub const MAX_DIFF_CHARS: usize = 50_000;
pub const QUERY_LIMIT_RANGE: std::ops::RangeInclusive<u32> = 1..=100;
pub const IMPACT_DEPTH_RANGE: std::ops::RangeInclusive<u32> = 1..=10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryParams {
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_content: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_content: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Upstream,
    Downstream,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactParams {
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_tests: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectChangesParams {
    pub diff: String,
}

/// A decoded graph operation.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphTool {
    ListRepos,
    Query(QueryParams),
    Context(ContextParams),
    Impact(ImpactParams),
    DetectChanges(DetectChangesParams),
}

impl GraphTool {
    pub const NAMES: [&'static str; 5] =
        ["list_repos", "query", "context", "impact", "detect_changes"];

    /// Decode `arguments` for the tool called `name`.
    pub fn parse(name: &str, arguments: Value) -> Result<Self> {
        let arguments = match arguments {
            Value::Null => Value::Object(Default::default()),
            other => other,
        };
        let invalid = |e: serde_json::Error| GraphHookError::InvalidParams {
            tool: name.to_string(),
            reason: e.to_string(),
        };
        match name {
            "list_repos" => Ok(Self::ListRepos),
            "query" => serde_json::from_value(arguments).map(Self::Query).map_err(invalid),
            "context" => serde_json::from_value(arguments).map(Self::Context).map_err(invalid),
            "impact" => serde_json::from_value(arguments).map(Self::Impact).map_err(invalid),
            "detect_changes" => serde_json::from_value(arguments)
                .map(Self::DetectChanges)
                .map_err(invalid),
            _ => Err(GraphHookError::UnknownTool {
                name: name.to_string(),
            }),
        }
    }

    /// Tool name on the backend side.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ListRepos => "list_repos",
            Self::Query(_) => "query",
            Self::Context(_) => "context",
            Self::Impact(_) => "impact",
            Self::DetectChanges(_) => "detect_changes",
        }
    }

    /// Listing repositories does not depend on the current tree being indexed.
    pub fn needs_index(&self) -> bool {
        !matches!(self, Self::ListRepos)
    }

    /// Validate against `cwd` and build the backend arguments.
    pub fn arguments(&self, cwd: &Path) -> Result<Value> {
        let invalid = |reason: String| GraphHookError::InvalidParams {
            tool: self.name().to_string(),
            reason,
        };

        match self {
            Self::ListRepos => Ok(Value::Object(Default::default())),
            Self::Query(p) => {
                if p.query.trim().is_empty() {
                    return Err(invalid("query must not be empty".into()));
                }
                if let Some(limit) = p.limit {
                    if !QUERY_LIMIT_RANGE.contains(&limit) {
                        return Err(invalid(format!("limit must be 1-100, got {limit}")));
                    }
                }
                Ok(serde_json::to_value(p)?)
            }
            Self::Context(p) => {
                let has = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
                if !has(&p.name) && !has(&p.uid) {
                    return Err(invalid("either name or uid is required".into()));
                }
                if let Some(file) = &p.file {
                    paths::resolve_within(cwd, file)?;
                }
                Ok(serde_json::to_value(p)?)
            }
            Self::Impact(p) => {
                if p.target.trim().is_empty() {
                    return Err(invalid("target must not be empty".into()));
                }
                if let Some(depth) = p.depth {
                    if !IMPACT_DEPTH_RANGE.contains(&depth) {
                        return Err(invalid(format!("depth must be 1-10, got {depth}")));
                    }
                }
                Ok(serde_json::to_value(p)?)
            }
            Self::DetectChanges(p) => {
                let len = p.diff.chars().count();
                if len > MAX_DIFF_CHARS {
                    return Err(invalid(format!(
                        "diff is {len} characters, limit is {MAX_DIFF_CHARS}"
                    )));
                }
                Ok(serde_json::to_value(p)?)
            }
        }
    }
}

/// What a graph operation hands back to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "text", rename_all = "snake_case")]
pub enum ToolOutput {
    Text(String),
    NoResults,
    /// Usage or configuration problem the operator can act on.
    Rejected(String),
}

/// Runs graph operations over the long-lived RPC transport.
pub struct ToolSurface {
    transport: Arc<RpcTransport>,
    index: IndexLocator,
}

impl ToolSurface {
    pub fn new(transport: Arc<RpcTransport>, index: IndexLocator) -> Self {
        Self { transport, index }
    }

    pub fn transport(&self) -> &Arc<RpcTransport> {
        &self.transport
    }

    /// Decode and run a tool call by name.
    pub async fn call(&self, name: &str, arguments: Value) -> ToolOutput {
        match GraphTool::parse(name, arguments) {
            Ok(tool) => self.run(&tool).await,
            Err(e) => ToolOutput::Rejected(e.to_string()),
        }
    }

    pub async fn run(&self, tool: &GraphTool) -> ToolOutput {
        let cwd = self.transport.working_directory();
        if tool.needs_index() && !self.index.is_indexed(cwd) {
            return ToolOutput::Rejected(
                GraphHookError::NoIndex {
                    cwd: cwd.to_path_buf(),
                }
                .to_string(),
            );
        }

        let arguments = match tool.arguments(cwd) {
            Ok(arguments) => arguments,
            Err(e) => return ToolOutput::Rejected(e.to_string()),
        };

        match self.transport.call_tool(tool.name(), arguments).await {
            Some(text) => ToolOutput::Text(text),
            None => ToolOutput::NoResults,
        }
    }
}
