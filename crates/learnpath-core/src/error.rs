use thiserror::Error;

/// Failures surfaced by the progress store's write path.
///
/// Read paths never fail: unreadable, corrupt, or stale data is replaced
/// by defaults instead.
#[derive(Error, Debug)]
pub enum ProgressError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Failed to persist progress: {0:#}")]
    Storage(#[from] anyhow::Error),

    #[error("Failed to encode progress store: {0}")]
    Serialize(#[from] serde_json::Error),
}
