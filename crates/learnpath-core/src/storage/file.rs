use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use super::BlobStorage;

/// Stores each key as `<key>.json` inside a data directory.
pub struct FileStorage {
    data_dir: PathBuf,
}

impl FileStorage {
    /// Opens (and creates if needed) the data directory.
    pub fn new(data_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;
        Ok(Self { data_dir })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn blob_path(&self, key: &str) -> PathBuf {
        self.data_dir.join(format!("{}.json", key))
    }
}

impl BlobStorage for FileStorage {
    fn read_blob(&self, key: &str) -> Result<Option<String>> {
        let path = self.blob_path(key);
        if !path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read blob file: {}", key))?;
        Ok(Some(contents))
    }

    fn write_blob(&self, key: &str, blob: &str) -> Result<()> {
        let path = self.blob_path(key);
        // Readers only ever see a complete blob: write aside, then rename over.
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, blob).with_context(|| format!("Failed to write blob file: {}", key))?;
        std::fs::rename(&tmp, &path)
            .with_context(|| format!("Failed to replace blob file: {}", key))?;
        debug!(key = key, bytes = blob.len(), "Blob written");
        Ok(())
    }

    fn remove_blob(&self, key: &str) -> Result<()> {
        let path = self.blob_path(key);
        if path.exists() {
            std::fs::remove_file(&path)
                .with_context(|| format!("Failed to remove blob file: {}", key))?;
        }
        Ok(())
    }
}
