use std::sync::Arc;

use anyhow::Result;
use chrono::Duration;
use tracing::{debug, warn};

use super::{default_knowledge_points, CacheEnvelope};
use crate::api::{FetchError, KnowledgeSource};
use crate::clock::{Clock, SystemClock};
use crate::models::KnowledgePoint;
use crate::storage::BlobStorage;

/// Storage key of the envelope blob.
pub const KNOWLEDGE_CACHE_KEY: &str = "knowledge_points_cache";

/// How long an envelope stays valid after its last refresh.
const DEFAULT_TTL_HOURS: i64 = 24;

/// Where a lookup's points came from.
#[derive(Debug)]
pub enum Source {
    /// Served from a fresh envelope without touching the network.
    Cache,
    /// Fetched and written back into the envelope.
    Remote,
    /// The fetch failed; these are the built-in defaults and nothing was stored.
    Fallback(FetchError),
}

#[derive(Debug)]
pub struct KnowledgeLookup {
    pub points: Vec<KnowledgePoint>,
    pub source: Source,
}

impl KnowledgeLookup {
    pub fn is_fallback(&self) -> bool {
        matches!(self.source, Source::Fallback(_))
    }

    pub fn into_points(self) -> Vec<KnowledgePoint> {
        self.points
    }
}

pub struct KnowledgeCache<S, F> {
    storage: S,
    source: F,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl<S: BlobStorage, F: KnowledgeSource> KnowledgeCache<S, F> {
    pub fn new(storage: S, source: F) -> Self {
        Self {
            storage,
            source,
            clock: Arc::new(SystemClock),
            ttl: Duration::hours(DEFAULT_TTL_HOURS),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Knowledge points for a node.
    ///
    /// Served from the envelope while it is fresh; otherwise fetched and
    /// cached. If the fetch fails the module's default points are returned
    /// and nothing is written.
    pub async fn get_knowledge_points(&self, module: &str, node_id: &str) -> KnowledgeLookup {
        let now = self.clock.now_millis();
        if let Some(points) = self
            .fresh_envelope_or_absent(now)
            .and_then(|envelope| envelope.get(module, node_id).cloned())
        {
            debug!(module = module, node_id = node_id, "Knowledge point cache hit");
            return KnowledgeLookup {
                points,
                source: Source::Cache,
            };
        }

        debug!(module = module, node_id = node_id, "Knowledge point cache miss, fetching");
        match self.source.fetch_knowledge_points(module, node_id).await {
            Ok(points) => {
                self.store_points(module, node_id, &points);
                KnowledgeLookup {
                    points,
                    source: Source::Remote,
                }
            }
            Err(e) => {
                warn!(module = module, node_id = node_id, error = %e, "Knowledge point fetch failed, using defaults");
                KnowledgeLookup {
                    points: default_knowledge_points(module),
                    source: Source::Fallback(e),
                }
            }
        }
    }

    /// Drop the whole envelope.
    pub fn invalidate(&self) -> Result<()> {
        self.storage.remove_blob(KNOWLEDGE_CACHE_KEY)
    }

    /// Age of the current envelope, or `None` when nothing fresh is cached.
    pub fn cache_age(&self) -> Option<String> {
        let now = self.clock.now_millis();
        self.fresh_envelope_or_absent(now)
            .map(|envelope| envelope.age_display(now))
    }

    fn fresh_envelope_or_absent(&self, now: i64) -> Option<CacheEnvelope> {
        self.read_fresh_envelope(now).unwrap_or_else(|e| {
            warn!(error = %e, "Failed to read knowledge point cache");
            None
        })
    }

    /// Snapshot of the envelope if one exists and is within the TTL.
    /// An expired envelope is removed from storage; a corrupt one is
    /// ignored. Only a failing storage read is an error.
    fn read_fresh_envelope(&self, now: i64) -> Result<Option<CacheEnvelope>> {
        let Some(blob) = self.storage.read_blob(KNOWLEDGE_CACHE_KEY)? else {
            return Ok(None);
        };

        let envelope: CacheEnvelope = match serde_json::from_str(&blob) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(error = %e, "Knowledge point cache is corrupt, ignoring it");
                return Ok(None);
            }
        };

        if envelope.is_expired(now, self.ttl) {
            debug!(age_minutes = envelope.age_minutes(now), "Knowledge point cache expired");
            if let Err(e) = self.invalidate() {
                warn!(error = %e, "Failed to remove expired knowledge point cache");
            }
            return Ok(None);
        }

        Ok(Some(envelope))
    }

    fn store_points(&self, module: &str, node_id: &str, points: &[KnowledgePoint]) {
        // Re-read after the fetch so entries written meanwhile are kept.
        let now = self.clock.now_millis();
        let mut envelope = match self.read_fresh_envelope(now) {
            Ok(envelope) => envelope.unwrap_or_else(|| CacheEnvelope::new(now)),
            Err(e) => {
                warn!(module = module, node_id = node_id, error = %e, "Failed to read knowledge point cache, not caching fetched points");
                return;
            }
        };
        envelope.insert(module, node_id, points.to_vec(), now);

        let result = serde_json::to_string(&envelope)
            .map_err(anyhow::Error::from)
            .and_then(|blob| self.storage.write_blob(KNOWLEDGE_CACHE_KEY, &blob));
        if let Err(e) = result {
            warn!(module = module, node_id = node_id, error = %e, "Failed to cache knowledge points");
        }
    }
}
