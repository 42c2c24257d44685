use std::path::PathBuf;
use std::sync::Arc;

use tokio::io::AsyncReadExt;

use crate::augment::Augmenter;
use crate::config::GraphHookConfig;
use crate::error::Result;
use crate::event::ToolEvent;
use crate::invoke::OneShotInvoker;

/// Augment a single tool event read from stdin. Prints the augmented event,
/// or nothing when there is nothing to add.
pub async fn run_hook(cwd: Option<PathBuf>) -> Result<()> {
    let cwd = super::resolve_cwd(cwd);
    let config = GraphHookConfig::load(&cwd)?;

    let mut input = String::new();
    tokio::io::stdin().read_to_string(&mut input).await?;
    let event: ToolEvent = serde_json::from_str(&input)?;

    let lookup = Arc::new(OneShotInvoker::from_config(
        config.command.clone(),
        &config.augment,
    ));
    let mut augmenter = Augmenter::from_config(lookup, &config, cwd.clone());

    if !augmenter.index().is_indexed(&cwd) {
        eprintln!(
            "graph-hook: no {} index at or above {}",
            augmenter.index().marker(),
            cwd.display()
        );
    }

    if let Some(augmented) = augmenter.on_tool_result(&event).await {
        println!("{}", serde_json::to_string(&augmented)?);
    }
    Ok(())
}
