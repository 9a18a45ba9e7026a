//! Per-node learning progress.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Progress on one learning node.
///
/// `overall_progress` is derived from `knowledge_points` and is only ever
/// set by the progress store's write path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct NodeProgress {
    pub node_id: String,
    pub overall_progress: u8,
    #[serde(default)]
    pub knowledge_points: BTreeMap<String, bool>,
    /// Minutes studied. Never decreases.
    #[serde(default)]
    pub study_time: u64,
    #[serde(default)]
    pub completed_tasks: u32,
    #[serde(default)]
    pub quiz_score: u32,
    #[serde(default)]
    pub last_study_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl NodeProgress {
    /// A fresh, all-zero record created at `now`.
    pub fn new(node_id: &str, now: i64) -> Self {
        Self {
            node_id: node_id.to_string(),
            overall_progress: 0,
            knowledge_points: BTreeMap::new(),
            study_time: 0,
            completed_tasks: 0,
            quiz_score: 0,
            last_study_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn completed_count(&self) -> usize {
        self.knowledge_points.values().filter(|&&done| done).count()
    }

    pub fn stats(&self) -> LearningStats {
        LearningStats {
            study_time: self.study_time,
            completed_tasks: self.completed_tasks,
            quiz_score: self.quiz_score,
            last_study_at: self.last_study_at,
            overall_progress: self.overall_progress,
            updated_at: self.updated_at,
        }
    }

    /// Shallow-merge `update` on top of this record. Fields left `None`
    /// keep their current value.
    pub(crate) fn merge(&mut self, update: ProgressUpdate) {
        if let Some(points) = update.knowledge_points {
            self.knowledge_points = points;
        }
        if let Some(study_time) = update.study_time {
            self.study_time = study_time;
        }
        if let Some(completed_tasks) = update.completed_tasks {
            self.completed_tasks = completed_tasks;
        }
        if let Some(quiz_score) = update.quiz_score {
            self.quiz_score = quiz_score;
        }
        if let Some(last_study_at) = update.last_study_at {
            self.last_study_at = Some(last_study_at);
        }
    }
}

/// A partial update for `NodeProgress`.
///
/// Pass fully resolved values: the write path is last-write-wins, so an
/// update built from a stale snapshot overwrites newer data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct ProgressUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub knowledge_points: Option<BTreeMap<String, bool>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub study_time: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_tasks: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quiz_score: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_study_at: Option<i64>,
}

impl ProgressUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl From<NodeProgress> for ProgressUpdate {
    fn from(progress: NodeProgress) -> Self {
        Self {
            knowledge_points: Some(progress.knowledge_points),
            study_time: Some(progress.study_time),
            completed_tasks: Some(progress.completed_tasks),
            quiz_score: Some(progress.quiz_score),
            last_study_at: progress.last_study_at,
        }
    }
}

/// Summary figures for a node, as shown on the progress page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct LearningStats {
    pub study_time: u64,
    pub completed_tasks: u32,
    pub quiz_score: u32,
    pub last_study_at: Option<i64>,
    pub overall_progress: u8,
    pub updated_at: i64,
}
