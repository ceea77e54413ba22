use std::io::Cursor;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::io::{AsyncRead, AsyncReadExt};

use super::error::StorageError;

/// Type alias for a boxed async reader.
pub type BoxReader = Box<dyn AsyncRead + Unpin + Send>;

/// Metadata about a stored blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlobInfo {
    /// Size in bytes.
    pub size: u64,
    /// When the blob was last written.
    pub modified: DateTime<Utc>,
}

/// Path-addressed blob storage.
///
/// Paths are relative, `/`-separated and validated by
/// [`validate_blob_path`](super::validate_blob_path). Writing to an existing
/// path replaces its content.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store bytes at `path`.
    async fn put(&self, path: &str, data: &[u8]) -> Result<(), StorageError> {
        let reader: BoxReader = Box::new(Cursor::new(data.to_vec()));
        self.put_stream(path, reader).await.map(|_| ())
    }

    /// Store data from an async reader at `path` and return the number of bytes written.
    async fn put_stream(&self, path: &str, reader: BoxReader) -> Result<u64, StorageError>;

    /// Retrieve all bytes stored at `path`.
    async fn get(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        let mut reader = self.get_stream(path).await?;
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).await?;
        Ok(buf)
    }

    /// Retrieve a blob as a streaming async reader.
    async fn get_stream(&self, path: &str) -> Result<BoxReader, StorageError>;

    /// Check whether a blob exists.
    async fn exists(&self, path: &str) -> Result<bool, StorageError>;

    /// Delete a blob.
    ///
    /// Returns `true` if the blob was deleted, `false` if it did not exist.
    async fn delete(&self, path: &str) -> Result<bool, StorageError>;

    /// Get size and modification time of a blob.
    async fn stat(&self, path: &str) -> Result<BlobInfo, StorageError>;

    /// Delete every blob under a directory prefix (`""` empties the store).
    ///
    /// Returns the number of blobs removed.
    async fn delete_prefix(&self, prefix: &str) -> Result<usize, StorageError>;
}
