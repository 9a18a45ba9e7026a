//! Core library for learnpath.
//!
//! This crate keeps a learner's data available offline:
//!
//! - [`cache`]: knowledge points per `(module, node)`, cached in one
//!   envelope that expires after 24 hours and falls back to a built-in
//!   table when the remote fetch fails.
//! - [`progress`]: per-node learning progress in a versioned store that is
//!   reset wholesale when the schema version changes.
//! - [`storage`]: the key-value persistence both of them write through.
//! - [`api`]: the HTTP client that fetches knowledge points.
//!
//! Nothing in this crate touches global state. Storage, clock, and fetch
//! source are handed in by the caller, so the same types run against files
//! in the CLI and against in-memory fakes in tests.

pub mod api;
pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod models;
pub mod progress;
pub mod storage;

pub use api::{FetchError, KnowledgeApiClient, KnowledgeSource};
pub use cache::{default_knowledge_points, CacheEnvelope, KnowledgeCache, KnowledgeLookup, Source};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use error::ProgressError;
pub use models::{
    KnowledgePoint, LearningStats, Level, MasteryStatus, NodeProgress, ProgressUpdate,
};
pub use progress::{calculate_progress, ProgressTracker, PROGRESS_SCHEMA_VERSION};
pub use storage::{BlobStorage, FileStorage, MemoryStorage};
