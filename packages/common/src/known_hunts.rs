use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

/// File name of the known-hunt slot inside a data directory.
pub const SLOT_FILE_NAME: &str = "qr-treasure-hunt-known-hunts.json";

/// Device-local set of hunt IDs this device has created or visited.
///
/// Persisted as a JSON array of ID strings in a single file. This is a
/// convenience index, never a source of truth: every operation degrades to a
/// no-op (or an empty result) when the slot cannot be read or written.
pub struct KnownHuntSet {
    slot: PathBuf,
    /// Serializes read-modify-write cycles within this process.
    lock: Mutex<()>,
}

impl KnownHuntSet {
    pub fn new(slot: impl Into<PathBuf>) -> Self {
        Self {
            slot: slot.into(),
            lock: Mutex::new(()),
        }
    }

    /// Slot file inside `dir`, named [`SLOT_FILE_NAME`].
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(SLOT_FILE_NAME))
    }

    pub fn slot(&self) -> &Path {
        &self.slot
    }

    /// Known IDs in insertion order.
    pub async fn list(&self) -> Vec<Uuid> {
        let _guard = self.lock.lock().await;
        self.read().await
    }

    pub async fn has(&self, id: Uuid) -> bool {
        self.list().await.contains(&id)
    }

    /// Insert `id` unless it is already present.
    pub async fn add(&self, id: Uuid) {
        let _guard = self.lock.lock().await;
        let mut ids = self.read().await;
        if ids.contains(&id) {
            return;
        }
        ids.push(id);
        self.write(&ids).await;
    }

    /// Remove `id` if present.
    pub async fn remove(&self, id: Uuid) {
        self.remove_all(&[id]).await;
    }

    /// Remove several IDs in one write.
    pub async fn remove_all(&self, remove: &[Uuid]) {
        let _guard = self.lock.lock().await;
        let mut ids = self.read().await;
        let before = ids.len();
        ids.retain(|id| !remove.contains(id));
        if ids.len() != before {
            self.write(&ids).await;
        }
    }

    /// Forget every known hunt.
    pub async fn clear(&self) {
        let _guard = self.lock.lock().await;
        match fs::remove_file(&self.slot).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(slot = %self.slot.display(), error = %e, "Failed to clear known hunts"),
        }
    }

    async fn read(&self) -> Vec<Uuid> {
        let raw = match fs::read(&self.slot).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                warn!(slot = %self.slot.display(), error = %e, "Failed to read known hunts");
                return Vec::new();
            }
        };

        match serde_json::from_slice::<Vec<String>>(&raw) {
            Ok(entries) => entries
                .iter()
                .filter_map(|entry| Uuid::parse_str(entry).ok())
                .collect(),
            Err(e) => {
                debug!(slot = %self.slot.display(), error = %e, "Ignoring malformed known hunts slot");
                Vec::new()
            }
        }
    }

    async fn write(&self, ids: &[Uuid]) {
        let entries: Vec<String> = ids.iter().map(Uuid::to_string).collect();
        let result = async {
            let json = serde_json::to_vec(&entries)?;
            if let Some(parent) = self.slot.parent() {
                fs::create_dir_all(parent).await?;
            }
            let temp = self.slot.with_extension("json.tmp");
            fs::write(&temp, json).await?;
            fs::rename(&temp, &self.slot).await?;
            Ok::<_, std::io::Error>(())
        }
        .await;

        if let Err(e) = result {
            warn!(slot = %self.slot.display(), error = %e, "Failed to persist known hunts");
        }
    }
}
