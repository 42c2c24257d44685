use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{GraphHookError, Result};

/// Environment variable that overrides the configured backend command.
pub const COMMAND_ENV: &str = "GRAPH_HOOK_COMMAND";

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphHookConfig {
    /// Backend command vector. `mcp` or `augment <pattern>` is appended at spawn time.
    #[serde(default = "default_command")]
    pub command: Vec<String>,

    /// Per-tool-call augmentation settings.
    #[serde(default)]
    pub augment: AugmentConfig,

    /// Where to look for the index marker.
    #[serde(default)]
    pub index: IndexConfig,

    /// Additional recognized source extensions.
    #[serde(default)]
    pub extensions: ExtensionConfig,

    /// Long-lived RPC connection settings.
    #[serde(default)]
    pub rpc: RpcConfig,
}

fn default_command() -> Vec<String> {
    vec!["gitnexus".into()]
}

impl Default for GraphHookConfig {
    fn default() -> Self {
        Self {
            command: default_command(),
            augment: AugmentConfig::default(),
            index: IndexConfig::default(),
            extensions: ExtensionConfig::default(),
            rpc: RpcConfig::default(),
        }
    }
}

impl GraphHookConfig {
    /// Load config from a YAML file. Returns default if file doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&contents).map_err(|e| GraphHookError::ConfigParse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Load the effective config for a project.
    ///
    /// Checks `.graph-hook/config.yml` under the project root, then the global
    /// `~/.config/graph-hook/config.yml`. `GRAPH_HOOK_COMMAND` overrides `command`.
    pub fn load(project_root: &Path) -> Result<Self> {
        let project = project_root.join(".graph-hook").join("config.yml");
        let mut config = if project.exists() {
            Self::load_from(&project)?
        } else {
            Self::load_from(&super::dirs_global().join("config.yml"))?
        };

        if let Ok(raw) = std::env::var(COMMAND_ENV) {
            let command: Vec<String> = raw.split_whitespace().map(String::from).collect();
            if !command.is_empty() {
                config.command = command;
            }
        }

        Ok(config)
    }
}

/// Which output stream of the one-shot backend carries lookup results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputStream {
    Stdout,
    Stderr,
}

/// Augmentation limits and the one-shot invoker budget.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AugmentConfig {
    pub timeout_secs: u64,
    pub max_output_chars: usize,
    /// Fan-out cap for single-pattern tools.
    pub max_patterns: usize,
    /// Fan-out cap for multi-file reads.
    pub batch_limit: usize,
    /// Filename candidates pulled from `path:line:` result lines.
    pub secondary_limit: usize,
    /// The gitnexus CLI writes augment results to stderr; other backends may not.
    pub output_stream: OutputStream,
}

impl Default for AugmentConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 8,
            max_output_chars: 8192,
            max_patterns: 3,
            batch_limit: 5,
            secondary_limit: 2,
            output_stream: OutputStream::Stderr,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Directory name whose presence marks a built graph.
    pub marker: String,
    /// Ancestor levels searched above the working directory.
    pub max_depth: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            marker: ".gitnexus".into(),
            max_depth: 5,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtensionConfig {
    pub extra: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RpcConfig {
    /// Upper bound on spawn + initialize handshake.
    pub startup_timeout_secs: u64,
    pub client_name: String,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            startup_timeout_secs: 30,
            client_name: "graph-hook".into(),
        }
    }
}
