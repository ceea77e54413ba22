//! In-process change notifications that drive live subscriptions.

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Default number of changes buffered per subscriber before it lags.
const DEFAULT_CAPACITY: usize = 256;

/// A committed write, identified by the hunt it touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    /// Hunt fields (name, timestamps) changed.
    HuntUpdated(Uuid),
    /// The hunt and all of its clues are gone.
    HuntDeleted(Uuid),
    /// A clue was added, edited, removed or moved.
    CluesUpdated(Uuid),
}

impl Change {
    pub fn hunt_id(&self) -> Uuid {
        match self {
            Self::HuntUpdated(id) | Self::HuntDeleted(id) | Self::CluesUpdated(id) => *id,
        }
    }
}

/// Broadcast hub for [`Change`]s.
///
/// Publishing never blocks and never fails: with no subscribers the change
/// is simply dropped.
#[derive(Clone)]
pub struct ChangeFeed {
    sender: broadcast::Sender<Change>,
}

impl ChangeFeed {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn publish(&self, change: Change) {
        let _ = self.sender.send(change);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Change> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// A live subscription. Dropping it (or calling [`cancel`](Self::cancel))
/// stops further callbacks.
#[must_use = "dropping a Subscription cancels it immediately"]
pub struct Subscription {
    handle: JoinHandle<()>,
}

impl Subscription {
    pub(crate) fn new(handle: JoinHandle<()>) -> Self {
        Self { handle }
    }

    /// Stop delivering snapshots.
    pub fn cancel(self) {}

    pub fn is_active(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
