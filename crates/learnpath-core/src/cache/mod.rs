//! Local knowledge-point cache for offline access.
//!
//! This module provides the `KnowledgeCache` for storing and retrieving
//! knowledge points per `(module, node)`. Everything lives in one
//! `CacheEnvelope` blob that is considered expired 24 hours after its last
//! refresh.
//!
//! A failed fetch never reaches the caller: it is reported through
//! `Source::Fallback` alongside the built-in default points.

pub mod defaults;
pub mod envelope;
pub mod knowledge;

pub use defaults::default_knowledge_points;
pub use envelope::CacheEnvelope;
pub use knowledge::{KnowledgeCache, KnowledgeLookup, Source, KNOWLEDGE_CACHE_KEY};
