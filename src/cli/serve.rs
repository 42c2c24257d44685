use std::path::PathBuf;

use crate::config::GraphHookConfig;
use crate::error::Result;
use crate::host::{server, Service};

/// Run the host protocol on stdin/stdout until EOF or `shutdown`.
pub async fn run_serve(cwd: Option<PathBuf>) -> Result<()> {
    let cwd = super::resolve_cwd(cwd);
    let config = GraphHookConfig::load(&cwd)?;
    let mut service = Service::new(config, cwd.clone());

    eprintln!("graph-hook: serving {}", cwd.display());
    server::serve(&mut service, tokio::io::stdin(), tokio::io::stdout()).await
}
