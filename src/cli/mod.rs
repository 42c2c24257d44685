pub mod hook;
pub mod lookup;
pub mod serve;
pub mod status;
pub mod tool;

use std::path::PathBuf;

/// `--cwd` if given, else the process working directory. Always absolute
/// when the process directory can be read.
pub fn resolve_cwd(cwd: Option<PathBuf>) -> PathBuf {
    let cwd = cwd.unwrap_or_else(|| PathBuf::from("."));
    std::path::absolute(&cwd).unwrap_or(cwd)
}
