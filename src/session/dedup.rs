use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashSet;

/// Session-scoped set of patterns that have already been looked up.
pub struct DedupCache {
    seen: DashSet<String>,
    suppressed: AtomicU64,
}

impl Default for DedupCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DedupCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DedupCache")
            .field("entries", &self.seen.len())
            .field("suppressed", &self.suppressed.load(Ordering::Relaxed))
            .finish()
    }
}

impl DedupCache {
    pub fn new() -> Self {
        Self {
            seen: DashSet::new(),
            suppressed: AtomicU64::new(0),
        }
    }

    pub fn has(&self, key: &str) -> bool {
        self.seen.contains(key)
    }

    /// Mark `key` as seen. Returns `false` if it was already present, so two
    /// racing inserts of the same key count once.
    pub fn add(&self, key: &str) -> bool {
        self.seen.insert(key.to_string())
    }

    /// Keep only keys not yet seen, counting the rest as suppressed.
    pub fn retain_unseen(&self, keys: Vec<String>) -> Vec<String> {
        keys.into_iter()
            .filter(|k| {
                let fresh = !self.has(k);
                if !fresh {
                    self.suppressed.fetch_add(1, Ordering::Relaxed);
                }
                fresh
            })
            .collect()
    }

    pub fn clear(&self) {
        self.seen.clear();
        self.suppressed.store(0, Ordering::Relaxed);
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    /// Lookups skipped because their key was already seen.
    pub fn suppressed(&self) -> u64 {
        self.suppressed.load(Ordering::Relaxed)
    }
}
