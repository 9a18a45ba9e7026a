use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::models::NodeProgress;

/// Current schema version of the persisted progress store.
///
/// Any other version on disk is discarded in full; there is no migration.
pub const PROGRESS_SCHEMA_VERSION: &str = "1.0";

/// The persisted progress blob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressStore {
    pub version: String,
    #[serde(default)]
    pub nodes: HashMap<String, NodeProgress>,
}

impl ProgressStore {
    pub fn new() -> Self {
        Self {
            version: PROGRESS_SCHEMA_VERSION.to_string(),
            nodes: HashMap::new(),
        }
    }

    pub fn is_current(&self) -> bool {
        self.version == PROGRESS_SCHEMA_VERSION
    }
}

impl Default for ProgressStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Percentage of completed knowledge points, rounded half away from zero.
/// An empty map is 0%.
pub fn calculate_progress(knowledge_points: &BTreeMap<String, bool>) -> u8 {
    let total = knowledge_points.len();
    if total == 0 {
        return 0;
    }
    let completed = knowledge_points.values().filter(|&&done| done).count();
    // Integer form of round(100 * completed / total); completed <= total keeps it <= 100.
    ((200 * completed + total) / (2 * total)) as u8
}
