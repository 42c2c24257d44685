use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum GraphHookError {
    #[error("config parse error in {path}: {reason}")]
    ConfigParse { path: PathBuf, reason: String },

    #[error("backend command is empty")]
    EmptyCommand,

    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("handshake failed: {reason}")]
    Handshake { reason: String },

    #[error("rpc error: {reason}")]
    Rpc { reason: String },

    #[error("connection closed")]
    ConnectionClosed,

    #[error("lookup timed out after {timeout_secs}s")]
    LookupTimeout { timeout_secs: u64 },

    #[error("lookup exited with status {code:?}")]
    LookupFailed { code: Option<i32> },

    #[error("invalid parameters for {tool}: {reason}")]
    InvalidParams { tool: String, reason: String },

    #[error("unknown tool: {name}")]
    UnknownTool { name: String },

    #[error("path escapes working directory: {path}")]
    PathEscape { path: String },

    #[error("no knowledge graph index found for {cwd}")]
    NoIndex { cwd: PathBuf },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, GraphHookError>;
