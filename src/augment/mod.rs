pub mod format;

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use futures::future::join_all;
use tracing::debug;

use crate::config::{AugmentConfig, GraphHookConfig};
use crate::event::{ContentBlock, ToolEvent};
use crate::extract::extensions::basename;
use crate::extract::{CodeExtensions, Extractor, ToolCall, ToolKind};
use crate::index::IndexLocator;
use crate::invoke::PatternLookup;
use crate::session::{SessionState, SessionStats};

/// Fan-out caps for one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AugmentLimits {
    pub max_patterns: usize,
    pub batch_limit: usize,
    pub secondary_limit: usize,
}

impl Default for AugmentLimits {
    fn default() -> Self {
        Self::from(&AugmentConfig::default())
    }
}

impl From<&AugmentConfig> for AugmentLimits {
    fn from(config: &AugmentConfig) -> Self {
        Self {
            max_patterns: config.max_patterns,
            batch_limit: config.batch_limit,
            secondary_limit: config.secondary_limit,
        }
    }
}

/// Turns tool results into graph-augmented tool results.
///
/// Owns the session state. Events must be fed one at a time; lookups within
/// one event run concurrently and are merged in dispatch order.
pub struct Augmenter {
    lookup: Arc<dyn PatternLookup>,
    extractor: Extractor,
    index: IndexLocator,
    limits: AugmentLimits,
    session: SessionState,
}

impl Augmenter {
    pub fn new(lookup: Arc<dyn PatternLookup>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            lookup,
            extractor: Extractor::default(),
            index: IndexLocator::default(),
            limits: AugmentLimits::default(),
            session: SessionState::new(cwd),
        }
    }

    pub fn from_config(
        lookup: Arc<dyn PatternLookup>,
        config: &GraphHookConfig,
        cwd: impl Into<PathBuf>,
    ) -> Self {
        Self::new(lookup, cwd)
            .with_extractor(Extractor::new(CodeExtensions::new(&config.extensions.extra)))
            .with_index(IndexLocator::from_config(&config.index))
            .with_limits(AugmentLimits::from(&config.augment))
    }

    pub fn with_extractor(mut self, extractor: Extractor) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_index(mut self, index: IndexLocator) -> Self {
        self.index = index;
        self
    }

    pub fn with_limits(mut self, limits: AugmentLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn stats(&self) -> SessionStats {
        self.session.stats()
    }

    pub fn index(&self) -> &IndexLocator {
        &self.index
    }

    /// Session boundary: clear dedup state and counters, re-enable augmentation.
    pub fn reset(&mut self, cwd: impl Into<PathBuf>) {
        self.session.reset(cwd);
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.session.augment_enabled = enabled;
    }

    /// Flip the toggle and return the new value.
    pub fn toggle(&mut self) -> bool {
        self.session.augment_enabled = !self.session.augment_enabled;
        self.session.augment_enabled
    }

    /// Augment one tool result. `None` means leave the result as it is.
    pub async fn on_tool_result(&mut self, event: &ToolEvent) -> Option<ToolEvent> {
        if !self.session.augment_enabled {
            return None;
        }
        let kind = ToolKind::from_name(&event.tool_name)?;
        self.session.hook_fire_count += 1;

        if !self.index.is_indexed(&self.session.working_directory) {
            debug!(cwd = %self.session.working_directory.display(), "no index, skipping augmentation");
            return None;
        }

        let call = ToolCall::decode(kind, &event.input)?;
        let text = event.result_text();
        let block = match call {
            ToolCall::ReadMany { .. } => self.augment_batch(&call, &text).await?,
            _ => self.augment_single(&call, &text).await?,
        };

        self.session.hit_count += 1;
        Some(event.with_appended(block))
    }

    async fn augment_single(&mut self, call: &ToolCall, text: &str) -> Option<ContentBlock> {
        let mut candidates: Vec<String> = self.extractor.extract(call).into_iter().collect();
        if call.kind().scans_results() {
            candidates.extend(
                self.extractor
                    .extract_secondary(text, self.limits.secondary_limit),
            );
        }

        let mut patterns = self.session.dedup.retain_unseen(unique(candidates));
        patterns.truncate(self.limits.max_patterns);
        if patterns.is_empty() {
            return None;
        }
        for pattern in &patterns {
            self.session.dedup.add(pattern);
        }

        debug!(?patterns, "dispatching graph lookups");
        let results = self.lookup_all(&patterns).await;
        let sections: Vec<String> = results.into_iter().flatten().collect();
        if sections.is_empty() {
            return None;
        }
        Some(format::single_block(&patterns, &sections))
    }

    async fn augment_batch(&mut self, call: &ToolCall, text: &str) -> Option<ContentBlock> {
        let pairs = self
            .extractor
            .extract_batch(call, text, self.limits.batch_limit);
        let fresh = self
            .session
            .dedup
            .retain_unseen(pairs.iter().map(|(_, c)| c.clone()).collect());
        let pairs: Vec<(String, String)> = pairs
            .into_iter()
            .filter(|(_, c)| fresh.contains(c))
            .collect();
        if pairs.is_empty() {
            return None;
        }
        for (_, candidate) in &pairs {
            self.session.dedup.add(candidate);
        }

        let patterns: Vec<String> = pairs.iter().map(|(_, c)| c.clone()).collect();
        debug!(?patterns, "dispatching batch graph lookups");
        let results = self.lookup_all(&patterns).await;

        let hits: Vec<(String, String)> = pairs
            .iter()
            .zip(results)
            .filter_map(|((path, _), result)| result.map(|text| (basename(path).to_string(), text)))
            .collect();
        if hits.is_empty() {
            return None;
        }
        Some(format::batch_block(&hits))
    }

    /// Run every lookup concurrently; results come back in `patterns` order.
    async fn lookup_all(&self, patterns: &[String]) -> Vec<Option<String>> {
        let cwd = self.session.working_directory.clone();
        let lookups = patterns.iter().map(|pattern| {
            let lookup = self.lookup.clone();
            let cwd = cwd.clone();
            async move {
                lookup
                    .lookup(pattern, &cwd)
                    .await
                    .filter(|text| !text.trim().is_empty())
            }
        });
        join_all(lookups).await
    }
}

/// Drop repeats, keeping first occurrences in order.
fn unique(items: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}
