//! Remote source of knowledge points.
//!
//! The cache only depends on [`KnowledgeSource`]. [`KnowledgeApiClient`]
//! is the HTTP implementation; it owns the request timeout and rate-limit
//! retries, so a slow backend shows up as an ordinary [`FetchError`].

pub mod client;
pub mod error;

pub use client::KnowledgeApiClient;
pub use error::FetchError;

use std::sync::Arc;

use futures::future::BoxFuture;

use crate::models::KnowledgePoint;

pub trait KnowledgeSource: Send + Sync {
    fn fetch_knowledge_points<'a>(
        &'a self,
        module: &'a str,
        node_id: &'a str,
    ) -> BoxFuture<'a, Result<Vec<KnowledgePoint>, FetchError>>;
}

impl<T: KnowledgeSource + ?Sized> KnowledgeSource for Arc<T> {
    fn fetch_knowledge_points<'a>(
        &'a self,
        module: &'a str,
        node_id: &'a str,
    ) -> BoxFuture<'a, Result<Vec<KnowledgePoint>, FetchError>> {
        (**self).fetch_knowledge_points(module, node_id)
    }
}
