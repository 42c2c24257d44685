use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One content block of a tool result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentBlock {
    /// Block kind, e.g. `text` or `image`.
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: "text".into(),
            text: Some(text.into()),
        }
    }
}

/// Snapshot of a completed tool invocation as delivered by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolEvent {
    #[serde(alias = "toolName")]
    pub tool_name: String,

    #[serde(default)]
    pub input: Map<String, Value>,

    #[serde(default, alias = "outputContent")]
    pub content: Vec<ContentBlock>,
}

impl ToolEvent {
    pub fn new(tool_name: impl Into<String>, input: Value) -> Self {
        Self {
            tool_name: tool_name.into(),
            input: match input {
                Value::Object(map) => map,
                _ => Map::new(),
            },
            content: Vec::new(),
        }
    }

    pub fn with_output(mut self, text: impl Into<String>) -> Self {
        self.content.push(ContentBlock::text(text));
        self
    }

    /// Text of all `text` blocks, newline-joined.
    pub fn result_text(&self) -> String {
        self.content
            .iter()
            .filter(|b| b.kind == "text")
            .filter_map(|b| b.text.as_deref())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// A copy of this event with one extra trailing block. Existing blocks are untouched.
    pub fn with_appended(&self, block: ContentBlock) -> Self {
        let mut augmented = self.clone();
        augmented.content.push(block);
        augmented
    }
}
