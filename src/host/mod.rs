pub mod server;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::augment::Augmenter;
use crate::config::GraphHookConfig;
use crate::error::GraphHookError;
use crate::event::ToolEvent;
use crate::index::IndexLocator;
use crate::invoke::{OneShotInvoker, PatternLookup};
use crate::rpc::{ConnectionState, Connector, ProcessConnector, RpcTransport};
use crate::session::SessionStats;
use crate::tools::{ToolOutput, ToolSurface};

/// One line from the host runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostRequest {
    SessionStart {
        cwd: PathBuf,
    },
    ToolResult(ToolEvent),
    Tool {
        name: String,
        #[serde(default)]
        arguments: Value,
    },
    Toggle {
        #[serde(default)]
        enabled: Option<bool>,
    },
    Status,
    Shutdown,
}

/// One line back to the host runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostReply {
    Unchanged,
    Augmented {
        event: ToolEvent,
    },
    ToolOutput {
        output: ToolOutput,
    },
    Status {
        stats: SessionStats,
        index: Option<PathBuf>,
        transport: ConnectionState,
    },
    Notice {
        message: String,
    },
    Error {
        message: String,
    },
}

/// Dispatches host requests to the augmenter and the tool surface.
///
/// Requests are handled one at a time; the session state is never touched
/// concurrently.
pub struct Service {
    config: GraphHookConfig,
    connector: Arc<dyn Connector>,
    augmenter: Augmenter,
    tools: ToolSurface,
}

impl Service {
    /// Service backed by the configured command, one-shot for augmentation
    /// and `mcp` for tool calls.
    pub fn new(config: GraphHookConfig, cwd: impl Into<PathBuf>) -> Self {
        let lookup = Arc::new(OneShotInvoker::from_config(
            config.command.clone(),
            &config.augment,
        ));
        let connector = Arc::new(ProcessConnector::new(config.command.clone()));
        Self::with_parts(config, lookup, connector, cwd)
    }

    pub fn with_parts(
        config: GraphHookConfig,
        lookup: Arc<dyn PatternLookup>,
        connector: Arc<dyn Connector>,
        cwd: impl Into<PathBuf>,
    ) -> Self {
        let cwd = anchored(cwd.into());
        let augmenter = Augmenter::from_config(lookup, &config, cwd.clone());
        let tools = ToolSurface::new(
            Arc::new(transport_for(&config, connector.clone(), &cwd)),
            IndexLocator::from_config(&config.index),
        );
        Self {
            config,
            connector,
            augmenter,
            tools,
        }
    }

    pub fn augmenter(&self) -> &Augmenter {
        &self.augmenter
    }

    pub fn transport(&self) -> &Arc<RpcTransport> {
        self.tools.transport()
    }

    pub async fn handle(&mut self, request: HostRequest) -> HostReply {
        match request {
            HostRequest::SessionStart { cwd } => self.start_session(cwd),
            HostRequest::ToolResult(event) => match self.augmenter.on_tool_result(&event).await {
                Some(event) => HostReply::Augmented { event },
                None => HostReply::Unchanged,
            },
            HostRequest::Tool { name, arguments } => HostReply::ToolOutput {
                output: self.tools.call(&name, arguments).await,
            },
            HostRequest::Toggle { enabled } => {
                let enabled = match enabled {
                    Some(enabled) => {
                        self.augmenter.set_enabled(enabled);
                        enabled
                    }
                    None => self.augmenter.toggle(),
                };
                HostReply::Notice {
                    message: format!(
                        "graph augmentation {}",
                        if enabled { "enabled" } else { "disabled" }
                    ),
                }
            }
            HostRequest::Status => self.status(),
            HostRequest::Shutdown => {
                self.shutdown();
                HostReply::Notice {
                    message: "shutting down".into(),
                }
            }
        }
    }

    pub fn status(&self) -> HostReply {
        let stats = self.augmenter.stats();
        HostReply::Status {
            index: self.augmenter.index().find(&stats.working_directory),
            transport: self.transport().state(),
            stats,
        }
    }

    pub fn shutdown(&self) {
        self.transport().stop();
    }

    /// Session boundary. The backend process is bound to its directory, so the
    /// transport is replaced along with the session state.
    fn start_session(&mut self, cwd: PathBuf) -> HostReply {
        let cwd = anchored(cwd);
        self.transport().stop();
        self.augmenter.reset(cwd.clone());
        self.tools = ToolSurface::new(
            Arc::new(transport_for(&self.config, self.connector.clone(), &cwd)),
            IndexLocator::from_config(&self.config.index),
        );
        info!(cwd = %cwd.display(), "session started");

        let message = match self.augmenter.index().find(&cwd) {
            Some(index) => format!("graph index found at {}", index.display()),
            None => GraphHookError::NoIndex { cwd }.to_string(),
        };
        HostReply::Notice { message }
    }
}

/// Session directories are kept absolute; tool path checks are relative to them.
fn anchored(cwd: PathBuf) -> PathBuf {
    std::path::absolute(&cwd).unwrap_or(cwd)
}

fn transport_for(
    config: &GraphHookConfig,
    connector: Arc<dyn Connector>,
    cwd: &Path,
) -> RpcTransport {
    RpcTransport::new(connector, cwd)
        .with_client_name(config.rpc.client_name.clone())
        .with_startup_timeout(Duration::from_secs(config.rpc.startup_timeout_secs))
}
