use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::store::{calculate_progress, ProgressStore, PROGRESS_SCHEMA_VERSION};
use crate::clock::{Clock, SystemClock};
use crate::error::ProgressError;
use crate::models::{LearningStats, NodeProgress, ProgressUpdate};
use crate::storage::BlobStorage;

/// Storage key of the progress store blob.
pub const PROGRESS_STORE_KEY: &str = "learning_progress";

/// Per-node learning progress backed by one versioned blob.
///
/// Reads never fail and never write. Writes load the store, merge, and
/// persist the whole blob; the last write wins.
pub struct ProgressTracker<S> {
    storage: S,
    clock: Arc<dyn Clock>,
}

impl<S: BlobStorage> ProgressTracker<S> {
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Progress for `node_id`, or a fresh default record when the node is
    /// unknown or the stored data is missing, unreadable, or from another
    /// schema version.
    pub fn get_node_progress(&self, node_id: &str) -> NodeProgress {
        let store = self.read_store().unwrap_or_else(|e| {
            warn!(error = %e, "Failed to read progress store");
            None
        });
        store
            .and_then(|mut store| store.nodes.remove(node_id))
            .unwrap_or_else(|| NodeProgress::new(node_id, self.clock.now_millis()))
    }

    /// Merge `update` into the node's record and persist it.
    ///
    /// `overall_progress` is recomputed from the merged knowledge points and
    /// `updated_at` is always set to now. Returns the stored record.
    ///
    /// A store that cannot be read is left untouched and the error is
    /// returned; only a missing, corrupt, or outdated store is replaced.
    pub fn save_node_progress(
        &self,
        node_id: &str,
        update: ProgressUpdate,
    ) -> Result<NodeProgress, ProgressError> {
        let now = self.clock.now_millis();
        let mut store = self.read_store()?.unwrap_or_default();

        let mut progress = store
            .nodes
            .remove(node_id)
            .unwrap_or_else(|| NodeProgress::new(node_id, now));
        progress.merge(update);
        progress.overall_progress = calculate_progress(&progress.knowledge_points);
        progress.updated_at = now;

        store.nodes.insert(node_id.to_string(), progress.clone());
        let blob = serde_json::to_string(&store)?;
        self.storage.write_blob(PROGRESS_STORE_KEY, &blob)?;

        debug!(node_id = node_id, overall_progress = progress.overall_progress, "Node progress saved");
        Ok(progress)
    }

    /// Mark a knowledge point done or not done and persist the new
    /// overall percentage.
    pub fn update_knowledge_status(
        &self,
        node_id: &str,
        kp_id: &str,
        completed: bool,
    ) -> Result<NodeProgress, ProgressError> {
        let mut progress = self.get_node_progress(node_id);
        progress.knowledge_points.insert(kp_id.to_string(), completed);
        progress.overall_progress = calculate_progress(&progress.knowledge_points);
        self.save_node_progress(node_id, progress.into())
    }

    /// Add `minutes` to the node's study time and stamp `last_study_at`.
    pub fn record_study_time(
        &self,
        node_id: &str,
        minutes: i64,
    ) -> Result<NodeProgress, ProgressError> {
        let minutes = u64::try_from(minutes).map_err(|_| {
            ProgressError::InvalidArgument(format!(
                "study time must be non-negative, got {} minutes",
                minutes
            ))
        })?;

        let progress = self.get_node_progress(node_id);
        self.save_node_progress(
            node_id,
            ProgressUpdate {
                study_time: Some(progress.study_time.saturating_add(minutes)),
                last_study_at: Some(self.clock.now_millis()),
                ..Default::default()
            },
        )
    }

    pub fn get_learning_stats(&self, node_id: &str) -> LearningStats {
        self.get_node_progress(node_id).stats()
    }

    /// Completion state of each knowledge point on the node.
    pub fn knowledge_status(&self, node_id: &str) -> BTreeMap<String, bool> {
        self.get_node_progress(node_id).knowledge_points
    }

    /// The stored blob if it exists, parses, and carries the current version.
    ///
    /// Only a failing storage read is an error.
    fn read_store(&self) -> anyhow::Result<Option<ProgressStore>> {
        let Some(blob) = self.storage.read_blob(PROGRESS_STORE_KEY)? else {
            return Ok(None);
        };

        let store: ProgressStore = match serde_json::from_str(&blob) {
            Ok(store) => store,
            Err(e) => {
                warn!(error = %e, "Progress store is corrupt, ignoring it");
                return Ok(None);
            }
        };

        if !store.is_current() {
            info!(stored = %store.version, current = PROGRESS_SCHEMA_VERSION, "Progress store version changed, resetting");
            return Ok(None);
        }

        Ok(Some(store))
    }
}
