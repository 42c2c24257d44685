use std::path::{Path, PathBuf};

use crate::config::IndexConfig;

/// Finds the on-disk marker that says a graph has been built for a tree.
#[derive(Debug, Clone)]
pub struct IndexLocator {
    marker: String,
    max_depth: usize,
}

impl Default for IndexLocator {
    fn default() -> Self {
        Self::from_config(&IndexConfig::default())
    }
}

impl IndexLocator {
    pub fn new(marker: impl Into<String>, max_depth: usize) -> Self {
        Self {
            marker: marker.into(),
            max_depth,
        }
    }

    pub fn from_config(config: &IndexConfig) -> Self {
        Self::new(config.marker.clone(), config.max_depth)
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// Search `cwd` and up to `max_depth` ancestors for the marker directory.
    pub fn find(&self, cwd: &Path) -> Option<PathBuf> {
        cwd.ancestors()
            .take(self.max_depth + 1)
            .map(|dir| dir.join(&self.marker))
            .find(|candidate| candidate.is_dir())
    }

    pub fn is_indexed(&self, cwd: &Path) -> bool {
        self.find(cwd).is_some()
    }
}
