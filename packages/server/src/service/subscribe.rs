use std::future::Future;
use std::sync::Arc;

use common::{Clue, Hunt, KnownHuntSet};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};
use uuid::Uuid;

use super::HuntService;
use crate::error::AppError;
use crate::feed::{Change, Subscription};

impl HuntService {
    /// Live view of one hunt.
    ///
    /// `callback` runs with the current snapshot before this returns, then
    /// after every change to the hunt or its clues. A deleted hunt is
    /// delivered as `None`.
    pub async fn subscribe_to_hunt<F>(
        &self,
        hunt_id: Uuid,
        callback: F,
    ) -> Result<Subscription, AppError>
    where
        F: Fn(Option<Hunt>) + Send + Sync + 'static,
    {
        self.subscribe_with(
            move |change| change.hunt_id() == hunt_id,
            move |svc| async move { svc.get_hunt(hunt_id).await },
            callback,
        )
        .await
    }

    /// Live view of a hunt's clues in hunt order; empty once the hunt is gone.
    pub async fn subscribe_to_clues<F>(
        &self,
        hunt_id: Uuid,
        callback: F,
    ) -> Result<Subscription, AppError>
    where
        F: Fn(Vec<Clue>) + Send + Sync + 'static,
    {
        self.subscribe_with(
            move |change| {
                matches!(change, Change::CluesUpdated(id) | Change::HuntDeleted(id) if *id == hunt_id)
            },
            move |svc| async move {
                Ok(svc
                    .get_hunt(hunt_id)
                    .await?
                    .map(|hunt| hunt.clues)
                    .unwrap_or_default())
            },
            callback,
        )
        .await
    }

    /// Live view of every hunt.
    pub async fn subscribe_to_hunts<F>(&self, callback: F) -> Result<Subscription, AppError>
    where
        F: Fn(Vec<Hunt>) + Send + Sync + 'static,
    {
        self.subscribe_with(
            |_| true,
            |svc| async move { svc.list_hunts().await },
            callback,
        )
        .await
    }

    /// Live view of the hunts a device knows about.
    ///
    /// Known IDs that no longer resolve are pruned from `known` on every
    /// snapshot, so the device set heals itself after deletions elsewhere.
    pub async fn subscribe_to_known_hunts<F>(
        &self,
        known: Arc<KnownHuntSet>,
        callback: F,
    ) -> Result<Subscription, AppError>
    where
        F: Fn(Vec<Hunt>) + Send + Sync + 'static,
    {
        // The known set changes outside the feed, so every change reloads.
        self.subscribe_with(
            |_| true,
            move |svc| {
                let known = known.clone();
                async move {
                    let ids = known.list().await;
                    let lookup = svc.lookup_hunts(&ids).await?;
                    if !lookup.missing.is_empty() {
                        debug!(missing = lookup.missing.len(), "Pruning unresolvable known hunts");
                        known.remove_all(&lookup.missing).await;
                    }
                    Ok(lookup.hunts)
                }
            },
            callback,
        )
        .await
    }

    /// Deliver an initial snapshot, then a fresh one after each matching
    /// change until the returned [`Subscription`] is cancelled.
    async fn subscribe_with<T, M, L, Fut, F>(
        &self,
        matches: M,
        load: L,
        callback: F,
    ) -> Result<Subscription, AppError>
    where
        T: Send + 'static,
        M: Fn(&Change) -> bool + Send + Sync + 'static,
        L: Fn(HuntService) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, AppError>> + Send + 'static,
        F: Fn(T) + Send + Sync + 'static,
    {
        // Subscribe before the first read so no change can slip in between.
        let mut changes = self.feed.subscribe();
        callback(load(self.clone()).await?);

        let svc = self.clone();
        let handle = tokio::spawn(async move {
            loop {
                match changes.recv().await {
                    Ok(change) if !matches(&change) => continue,
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        debug!(skipped, "Subscriber lagged; reloading snapshot");
                    }
                    Err(RecvError::Closed) => break,
                }

                match load(svc.clone()).await {
                    Ok(snapshot) => callback(snapshot),
                    Err(e) => warn!(error = %e, "Failed to reload subscription snapshot"),
                }
            }
        });

        Ok(Subscription::new(handle))
    }
}
