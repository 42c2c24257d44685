use std::path::PathBuf;

use crate::config::GraphHookConfig;
use crate::error::Result;
use crate::extract::MIN_CANDIDATE_LEN;
use crate::index::IndexLocator;
use crate::invoke::OneShotInvoker;

/// Look up one pattern with the one-shot invoker and print the context.
pub async fn run_lookup(pattern: &str, cwd: Option<PathBuf>) -> Result<()> {
    let cwd = super::resolve_cwd(cwd);
    let config = GraphHookConfig::load(&cwd)?;

    let pattern = pattern.trim();
    if pattern.chars().count() < MIN_CANDIDATE_LEN {
        eprintln!(
            "graph-hook: pattern '{}' is too short (minimum {} characters)",
            pattern, MIN_CANDIDATE_LEN
        );
        std::process::exit(1);
    }

    let index = IndexLocator::from_config(&config.index);
    if !index.is_indexed(&cwd) {
        eprintln!(
            "graph-hook: no {} index at or above {}; run the indexer first",
            index.marker(),
            cwd.display()
        );
        std::process::exit(1);
    }

    let invoker = OneShotInvoker::from_config(config.command.clone(), &config.augment);
    match invoker.invoke(pattern, &cwd).await {
        Some(text) => println!("{}", text),
        None => eprintln!("graph-hook: no context for '{}'", pattern),
    }
    Ok(())
}
