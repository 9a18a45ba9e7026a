//! Key-value persistence used by the knowledge cache and progress store.
//!
//! Each key holds one serialized blob. The cache and the store own their
//! key exclusively; callers above them never read these blobs directly.

pub mod file;
pub mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use anyhow::Result;

/// Synchronous blob storage keyed by string.
pub trait BlobStorage: Send + Sync {
    /// Returns `Ok(None)` when nothing is stored under `key`.
    fn read_blob(&self, key: &str) -> Result<Option<String>>;

    fn write_blob(&self, key: &str, blob: &str) -> Result<()>;

    /// Removing a missing key is not an error.
    fn remove_blob(&self, key: &str) -> Result<()>;
}

impl<S: BlobStorage + ?Sized> BlobStorage for std::sync::Arc<S> {
    fn read_blob(&self, key: &str) -> Result<Option<String>> {
        (**self).read_blob(key)
    }

    fn write_blob(&self, key: &str, blob: &str) -> Result<()> {
        (**self).write_blob(key, blob)
    }

    fn remove_blob(&self, key: &str) -> Result<()> {
        (**self).remove_blob(key)
    }
}
