//! JSON-RPC 2.0 client for the graph backend's `mcp` mode.
//!
//! Messages are newline-delimited JSON objects over the child's stdin/stdout.
//! Every failure is absorbed at this layer; callers see `None`, never an error.

pub mod framing;
pub mod pending;
pub mod transport;

pub use framing::LineBuffer;
pub use pending::PendingRequests;
pub use transport::{ConnectionState, Connector, Pipes, ProcessConnector, RpcTransport};

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const JSONRPC_VERSION: &str = "2.0";
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Reserved for the `initialize` request. Steady-state ids start after it.
pub const HANDSHAKE_ID: u64 = 1;

#[derive(Debug, Serialize)]
pub struct RpcRequest<'a> {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: &'a str,
    pub params: Value,
}

impl<'a> RpcRequest<'a> {
    pub fn new(id: u64, method: &'a str, params: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            method,
            params,
        }
    }
}

/// A message with no id; no response is expected.
#[derive(Debug, Serialize)]
pub struct RpcNotification<'a> {
    pub jsonrpc: &'static str,
    pub method: &'a str,
}

impl<'a> RpcNotification<'a> {
    pub fn new(method: &'a str) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            method,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcError {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

/// The `result` payload of a `tools/call` response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ToolCallResult {
    #[serde(default)]
    pub content: Vec<ToolContent>,
    #[serde(default, rename = "isError")]
    pub is_error: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ToolContent {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default, rename = "isError")]
    pub is_error: bool,
}

impl ToolCallResult {
    /// Newline-joined text of non-error text blocks, `None` when there is nothing to show.
    pub fn text(&self) -> Option<String> {
        if self.is_error {
            return None;
        }
        let text = self
            .content
            .iter()
            .filter(|c| c.kind == "text" && !c.is_error)
            .filter_map(|c| c.text.as_deref())
            .collect::<Vec<_>>()
            .join("\n");
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

/// Correlation id of a response. Messages carrying a `method` are requests or
/// notifications from the server and never match a pending call.
pub fn response_id(message: &Value) -> Option<u64> {
    if message.get("method").is_some() {
        return None;
    }
    match message.get("id")? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

/// The backend-reported error of a response, if any.
pub fn response_error(message: &Value) -> Option<RpcError> {
    match message.get("error") {
        None | Some(Value::Null) => None,
        Some(err) => Some(serde_json::from_value(err.clone()).unwrap_or(RpcError {
            code: 0,
            message: err.to_string(),
        })),
    }
}

/// Text of a `tools/call` response. Errors, error flags and empty content all yield `None`.
pub fn tool_call_text(response: &Value) -> Option<String> {
    if let Some(err) = response_error(response) {
        tracing::debug!(code = err.code, message = %err.message, "backend reported error");
        return None;
    }
    let result = response.get("result")?;
    serde_json::from_value::<ToolCallResult>(result.clone())
        .ok()?
        .text()
}
