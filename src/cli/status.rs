use std::path::PathBuf;

use crate::config::GraphHookConfig;
use crate::error::Result;
use crate::index::IndexLocator;

/// Print index presence and the effective configuration.
pub async fn run_status(cwd: Option<PathBuf>) -> Result<()> {
    let cwd = super::resolve_cwd(cwd);
    let config = GraphHookConfig::load(&cwd)?;
    let index = IndexLocator::from_config(&config.index);

    println!("Working directory: {}", cwd.display());
    match index.find(&cwd) {
        Some(path) => println!("Index: {}", path.display()),
        None => println!(
            "Index: none ({} not found within {} levels)",
            index.marker(),
            config.index.max_depth
        ),
    }
    println!("Command: {}", config.command.join(" "));
    println!(
        "Augment: timeout {}s, budget {} chars, {} patterns, {} files, results on {}",
        config.augment.timeout_secs,
        config.augment.max_output_chars,
        config.augment.max_patterns,
        config.augment.batch_limit,
        match config.augment.output_stream {
            crate::config::OutputStream::Stdout => "stdout",
            crate::config::OutputStream::Stderr => "stderr",
        }
    );
    Ok(())
}
