use std::io::Cursor;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::io::AsyncReadExt;

use super::error::StorageError;
use super::path::{validate_blob_path, validate_blob_prefix};
use super::traits::{BlobInfo, BlobStore, BoxReader};

struct MemoryBlob {
    data: Vec<u8>,
    modified: DateTime<Utc>,
}

/// In-memory blob store, for ephemeral caches and tests.
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: DashMap<String, MemoryBlob>,
    max_size: Option<u64>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_size(max_size: u64) -> Self {
        Self {
            blobs: DashMap::new(),
            max_size: Some(max_size),
        }
    }

    /// Number of stored blobs.
    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put_stream(&self, path: &str, mut reader: BoxReader) -> Result<u64, StorageError> {
        let path = validate_blob_path(path)?;
        let mut data = Vec::new();
        reader.read_to_end(&mut data).await?;

        let actual = data.len() as u64;
        if let Some(limit) = self.max_size
            && actual > limit
        {
            return Err(StorageError::SizeLimitExceeded { actual, limit });
        }

        self.blobs.insert(
            path.to_string(),
            MemoryBlob {
                data,
                modified: Utc::now(),
            },
        );
        Ok(actual)
    }

    async fn get_stream(&self, path: &str) -> Result<BoxReader, StorageError> {
        let path = validate_blob_path(path)?;
        let data = self
            .blobs
            .get(path)
            .map(|blob| blob.data.clone())
            .ok_or_else(|| StorageError::NotFound(path.to_string()))?;
        Ok(Box::new(Cursor::new(data)))
    }

    async fn exists(&self, path: &str) -> Result<bool, StorageError> {
        Ok(self.blobs.contains_key(validate_blob_path(path)?))
    }

    async fn delete(&self, path: &str) -> Result<bool, StorageError> {
        Ok(self.blobs.remove(validate_blob_path(path)?).is_some())
    }

    async fn stat(&self, path: &str) -> Result<BlobInfo, StorageError> {
        let path = validate_blob_path(path)?;
        self.blobs
            .get(path)
            .map(|blob| BlobInfo {
                size: blob.data.len() as u64,
                modified: blob.modified,
            })
            .ok_or_else(|| StorageError::NotFound(path.to_string()))
    }

    async fn delete_prefix(&self, prefix: &str) -> Result<usize, StorageError> {
        let prefix = validate_blob_prefix(prefix)?;
        let before = self.blobs.len();
        if prefix.is_empty() {
            self.blobs.clear();
        } else {
            let dir = format!("{prefix}/");
            self.blobs
                .retain(|path, _| path != prefix && !path.starts_with(&dir));
        }
        Ok(before.saturating_sub(self.blobs.len()))
    }
}
