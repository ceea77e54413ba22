//! Device-side media cache.
//!
//! Stored media paths resolve through three tiers: in-memory handles, a
//! persistent local blob store, and finally the remote server. Nothing is
//! ever evicted; hunts are small.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use common::media::MediaRef;
use common::storage::{BlobStore, StorageError, validate_blob_path};
use dashmap::DashMap;
use futures::future::join_all;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::ClientError;
use crate::remote::RemoteMedia;

pub const DEFAULT_PREFETCH_BATCH_SIZE: usize = 3;

/// Cached media bytes for one stored path, shared until released.
#[derive(Debug)]
pub struct MediaHandle {
    path: String,
    bytes: Bytes,
}

impl MediaHandle {
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Something a caller can render.
#[derive(Debug, Clone)]
pub enum MediaSource {
    /// Legacy absolute URL, passed through untouched.
    External(String),
    Local(Arc<MediaHandle>),
}

/// A persisted cache entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub path: String,
    pub size: u64,
    pub fetched_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct MediaCache {
    remote: Arc<dyn RemoteMedia>,
    local: Arc<dyn BlobStore>,
    handles: Arc<DashMap<String, Arc<MediaHandle>>>,
    /// Per-path locks. Loads and invalidations of one path never overlap.
    fetches: Arc<DashMap<String, Arc<Mutex<()>>>>,
    batch_size: usize,
}

impl MediaCache {
    pub fn new(remote: Arc<dyn RemoteMedia>, local: Arc<dyn BlobStore>) -> Self {
        Self {
            remote,
            local,
            handles: Arc::new(DashMap::new()),
            fetches: Arc::new(DashMap::new()),
            batch_size: DEFAULT_PREFETCH_BATCH_SIZE,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Turn a clue's media reference into something renderable.
    pub async fn resolve(&self, reference: &str) -> Result<MediaSource, ClientError> {
        match MediaRef::parse(reference) {
            MediaRef::External(url) => Ok(MediaSource::External(url.to_string())),
            MediaRef::Stored(path) => self.handle(path).await.map(MediaSource::Local),
        }
    }

    /// Drop the in-memory handle for `reference`. Persisted bytes stay.
    pub fn release(&self, reference: &str) {
        if let Some(path) = MediaRef::parse(reference).stored_path()
            && self.handles.remove(path).is_some()
        {
            debug!(path = %path, "Released media handle");
        }
    }

    /// Forget `reference` entirely so the next resolve fetches fresh bytes.
    pub async fn invalidate(&self, reference: &str) -> Result<(), ClientError> {
        let Some(path) = MediaRef::parse(reference).stored_path() else {
            return Ok(());
        };
        let path = validate_blob_path(path)?;
        let deleted = self
            .locked(path, async {
                self.handles.remove(path);
                self.local.delete(path).await
            })
            .await?;
        if deleted {
            debug!(path = %path, "Invalidated cached media");
        }
        Ok(())
    }

    /// Empty the persistent store and drop every handle.
    pub async fn clear(&self) -> Result<usize, ClientError> {
        self.handles.clear();
        let removed = self.local.delete_prefix("").await?;
        info!(removed, "Cleared media cache");
        Ok(removed)
    }

    /// Persisted entry for a stored path, if cached.
    pub async fn entry(&self, path: &str) -> Result<Option<CacheEntry>, ClientError> {
        let path = validate_blob_path(path)?;
        match self.local.stat(path).await {
            Ok(info) => Ok(Some(CacheEntry {
                path: path.to_string(),
                size: info.size,
                fetched_at: info.modified,
            })),
            Err(StorageError::NotFound(_)) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Warm the persistent store in the background.
    ///
    /// Legacy URLs and repeated paths are dropped, already cached paths are
    /// skipped, and only the rest are fetched `batch_size` at a time.
    /// Failures are logged per path and never stop the batch. Dropping the
    /// returned handle detaches the task.
    pub fn prefetch<I>(&self, references: I) -> JoinHandle<()>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let mut seen = HashSet::new();
        let paths: Vec<String> = references
            .into_iter()
            .map(Into::into)
            .filter_map(|reference| MediaRef::parse(&reference).stored_path().map(str::to_string))
            .filter(|path| seen.insert(path.clone()))
            .collect();

        let cache = self.clone();
        tokio::spawn(async move {
            let mut missing = Vec::with_capacity(paths.len());
            for path in paths {
                match cache.is_cached(&path).await {
                    Ok(true) => {}
                    Ok(false) => missing.push(path),
                    Err(e) => warn!(path = %path, error = %e, "Prefetch failed"),
                }
            }

            let mut fetched = 0;
            for batch in missing.chunks(cache.batch_size) {
                let results = join_all(batch.iter().map(|path| cache.load(path))).await;
                for (path, result) in batch.iter().zip(results) {
                    match result {
                        Ok(_) => fetched += 1,
                        Err(e) => warn!(path = %path, error = %e, "Prefetch failed"),
                    }
                }
            }
            debug!(missing = missing.len(), fetched, "Prefetch finished");
        })
    }

    async fn handle(&self, path: &str) -> Result<Arc<MediaHandle>, ClientError> {
        let path = validate_blob_path(path)?;
        if let Some(handle) = self.handles.get(path) {
            return Ok(handle.value().clone());
        }

        self.locked(path, async {
            if let Some(handle) = self.handles.get(path) {
                return Ok(handle.value().clone());
            }
            let bytes = self.load_locked(path).await?;
            let handle = Arc::new(MediaHandle {
                path: path.to_string(),
                bytes,
            });
            self.handles.insert(path.to_string(), handle.clone());
            Ok::<_, ClientError>(handle)
        })
        .await
    }

    async fn is_cached(&self, path: &str) -> Result<bool, ClientError> {
        let path = validate_blob_path(path)?;
        Ok(self.local.exists(path).await?)
    }

    /// Bytes for `path` from the local store, fetching them on a miss.
    async fn load(&self, path: &str) -> Result<Bytes, ClientError> {
        self.locked(path, self.load_locked(path)).await
    }

    /// Run `op` while holding the lock for `path`.
    ///
    /// The lock entry is removed once nobody else is waiting on it.
    async fn locked<F, T>(&self, path: &str, op: F) -> T
    where
        F: Future<Output = T>,
    {
        let lock = self.fetches.entry(path.to_string()).or_default().clone();
        let result = {
            let _guard = lock.lock().await;
            op.await
        };
        drop(lock);
        self.fetches.remove_if(path, |_, lock| Arc::strong_count(lock) == 1);
        result
    }

    async fn load_locked(&self, path: &str) -> Result<Bytes, ClientError> {
        match self.local.get(path).await {
            Ok(data) => return Ok(Bytes::from(data)),
            Err(StorageError::NotFound(_)) => {}
            Err(e) => warn!(path = %path, error = %e, "Cached media unreadable, refetching"),
        }

        let bytes = self.remote.fetch(path).await?;
        if let Err(e) = self.local.put(path, &bytes).await {
            warn!(path = %path, error = %e, "Failed to persist fetched media");
        }
        debug!(path = %path, size = bytes.len(), "Fetched media");
        Ok(bytes)
    }
}
