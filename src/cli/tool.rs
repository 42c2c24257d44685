use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::config::GraphHookConfig;
use crate::error::Result;
use crate::index::IndexLocator;
use crate::rpc::RpcTransport;
use crate::tools::{GraphTool, ToolOutput, ToolSurface};

/// Run one graph tool over the RPC transport and print its output.
pub async fn run_tool(name: &str, args: Option<&str>, cwd: Option<PathBuf>) -> Result<()> {
    let cwd = super::resolve_cwd(cwd);
    let config = GraphHookConfig::load(&cwd)?;

    if !GraphTool::NAMES.contains(&name) {
        eprintln!("graph-hook: unknown tool '{}'. Available tools:", name);
        for tool in GraphTool::NAMES {
            eprintln!("  - {}", tool);
        }
        std::process::exit(1);
    }

    let arguments: Value = match args {
        Some(raw) => serde_json::from_str(raw)?,
        None => Value::Null,
    };

    let transport = RpcTransport::spawning(config.command.clone(), cwd)
        .with_client_name(config.rpc.client_name.clone())
        .with_startup_timeout(Duration::from_secs(config.rpc.startup_timeout_secs));
    let surface = ToolSurface::new(
        Arc::new(transport),
        IndexLocator::from_config(&config.index),
    );

    let output = surface.call(name, arguments).await;
    surface.transport().stop();

    match output {
        ToolOutput::Text(text) => println!("{}", text),
        ToolOutput::NoResults => eprintln!("graph-hook: no results"),
        ToolOutput::Rejected(message) => {
            eprintln!("graph-hook: {}", message);
            std::process::exit(1);
        }
    }
    Ok(())
}
