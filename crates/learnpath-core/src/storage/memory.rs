use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use anyhow::{anyhow, Result};

use super::BlobStorage;

/// In-process storage. Contents are lost when it is dropped.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    blobs: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn blobs(&self) -> Result<MutexGuard<'_, HashMap<String, String>>> {
        self.blobs
            .lock()
            .map_err(|_| anyhow!("Memory storage lock poisoned"))
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        self.blobs().map(|b| b.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl BlobStorage for MemoryStorage {
    fn read_blob(&self, key: &str) -> Result<Option<String>> {
        Ok(self.blobs()?.get(key).cloned())
    }

    fn write_blob(&self, key: &str, blob: &str) -> Result<()> {
        self.blobs()?.insert(key.to_string(), blob.to_string());
        Ok(())
    }

    fn remove_blob(&self, key: &str) -> Result<()> {
        self.blobs()?.remove(key);
        Ok(())
    }
}

/// Memory storage whose reads can be switched to fail, for exercising the
/// error paths of callers.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct FlakyStorage {
    pub inner: MemoryStorage,
    fail_reads: std::sync::atomic::AtomicBool,
}

#[cfg(test)]
impl FlakyStorage {
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads
            .store(fail, std::sync::atomic::Ordering::SeqCst);
    }
}

#[cfg(test)]
impl BlobStorage for FlakyStorage {
    fn read_blob(&self, key: &str) -> Result<Option<String>> {
        if self.fail_reads.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(anyhow!("disk unavailable"));
        }
        self.inner.read_blob(key)
    }

    fn write_blob(&self, key: &str, blob: &str) -> Result<()> {
        self.inner.write_blob(key, blob)
    }

    fn remove_blob(&self, key: &str) -> Result<()> {
        self.inner.remove_blob(key)
    }
}
