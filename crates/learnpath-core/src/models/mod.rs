//! Data models for cached learning data.
//!
//! - `KnowledgePoint`, `Level`, `MasteryStatus`: knowledge-map entries
//! - `NodeProgress`, `ProgressUpdate`, `LearningStats`: per-node progress
//!
//! Field names serialize in camelCase so persisted blobs match what the
//! mini-app front-end reads.

pub mod knowledge;
pub mod progress;

pub use knowledge::{KnowledgePoint, Level, MasteryStatus};
pub use progress::{LearningStats, NodeProgress, ProgressUpdate};
