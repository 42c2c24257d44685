pub mod dedup;

pub use dedup::DedupCache;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-session augmentation state. Owned by the augmenter.
#[derive(Debug)]
pub struct SessionState {
    pub dedup: DedupCache,
    pub hook_fire_count: u64,
    pub hit_count: u64,
    pub augment_enabled: bool,
    pub working_directory: PathBuf,
    pub started_at: DateTime<Utc>,
}

impl SessionState {
    pub fn new(working_directory: impl Into<PathBuf>) -> Self {
        Self {
            dedup: DedupCache::new(),
            hook_fire_count: 0,
            hit_count: 0,
            augment_enabled: true,
            working_directory: working_directory.into(),
            started_at: Utc::now(),
        }
    }

    /// Start over in `working_directory`. Augmentation is re-enabled whatever its prior value.
    pub fn reset(&mut self, working_directory: impl Into<PathBuf>) {
        self.dedup.clear();
        self.hook_fire_count = 0;
        self.hit_count = 0;
        self.augment_enabled = true;
        self.working_directory = working_directory.into();
        self.started_at = Utc::now();
    }

    pub fn working_directory(&self) -> &Path {
        &self.working_directory
    }

    pub fn stats(&self) -> SessionStats {
        SessionStats {
            working_directory: self.working_directory.clone(),
            hook_fire_count: self.hook_fire_count,
            hit_count: self.hit_count,
            dedup_entries: self.dedup.len(),
            suppressed_lookups: self.dedup.suppressed(),
            augment_enabled: self.augment_enabled,
            started_at: self.started_at,
        }
    }
}

/// Snapshot of session counters for status reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    pub working_directory: PathBuf,
    pub hook_fire_count: u64,
    pub hit_count: u64,
    pub dedup_entries: usize,
    pub suppressed_lookups: u64,
    pub augment_enabled: bool,
    pub started_at: DateTime<Utc>,
}
