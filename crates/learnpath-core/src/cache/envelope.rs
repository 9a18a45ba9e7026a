use std::collections::BTreeMap;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::models::KnowledgePoint;

const MILLIS_PER_MINUTE: i64 = 60_000;

/// Knowledge points per module, then per node.
pub type ModuleMap = BTreeMap<String, BTreeMap<String, Vec<KnowledgePoint>>>;

/// The single persisted blob holding every cached knowledge point.
///
/// One timestamp governs the whole envelope: it is refreshed on every
/// insert, and once it is older than the TTL the envelope is dropped as a
/// unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheEnvelope {
    /// Epoch millis of the last refresh.
    pub timestamp: i64,
    #[serde(default)]
    pub data: ModuleMap,
}

impl CacheEnvelope {
    pub fn new(now: i64) -> Self {
        Self {
            timestamp: now,
            data: BTreeMap::new(),
        }
    }

    /// Whole minutes since the last refresh, saturating for timestamps too
    /// far in the past to subtract.
    pub fn age_minutes(&self, now: i64) -> i64 {
        now.saturating_sub(self.timestamp) / MILLIS_PER_MINUTE
    }

    /// Valid while `now - timestamp <= ttl`. A timestamp whose age does not
    /// fit in an `i64` counts as expired.
    pub fn is_expired(&self, now: i64, ttl: Duration) -> bool {
        match now.checked_sub(self.timestamp) {
            Some(age) => age > ttl.num_milliseconds(),
            None => true,
        }
    }

    pub fn get(&self, module: &str, node_id: &str) -> Option<&Vec<KnowledgePoint>> {
        self.data.get(module).and_then(|nodes| nodes.get(node_id))
    }

    pub fn insert(&mut self, module: &str, node_id: &str, points: Vec<KnowledgePoint>, now: i64) {
        self.data
            .entry(module.to_string())
            .or_default()
            .insert(node_id.to_string(), points);
        self.timestamp = now;
    }

    /// Number of cached `(module, node)` entries.
    pub fn entry_count(&self) -> usize {
        self.data.values().map(BTreeMap::len).sum()
    }

    pub fn age_display(&self, now: i64) -> String {
        let minutes = self.age_minutes(now);
        if minutes < 1 {
            // Also covers clock skew (negative age)
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else if minutes < 1440 {
            let hours = minutes / 60;
            if minutes % 60 >= 30 {
                format!("{}h ago", hours + 1)
            } else {
                format!("{}h ago", hours)
            }
        } else {
            let days = minutes / 1440;
            if (minutes % 1440) / 60 >= 12 {
                format!("{}d ago", days + 1)
            } else {
                format!("{}d ago", days)
            }
        }
    }
}
