//! Serialized access to the subscription document.

use std::sync::Arc;

use {
    courier_common::Snowflake,
    tokio::sync::Mutex,
    tracing::info,
};

use crate::{
    Result,
    store::SubscriptionStore,
    types::{Document, SubscriptionRecord},
};

/// Result of [`Subscriptions::add`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    AlreadySubscribed,
}

/// Owner of the subscription store.
///
/// Every read and every read-modify-write runs under one process-wide lock,
/// held from `load` until after `save`, so concurrent commands never lose
/// each other's updates and readers never see a half-applied change.
pub struct Subscriptions {
    store: Arc<dyn SubscriptionStore>,
    lock: Mutex<()>,
}

impl Subscriptions {
    pub fn new(store: Arc<dyn SubscriptionStore>) -> Self {
        Self {
            store,
            lock: Mutex::new(()),
        }
    }

    /// Load the document and inspect it under the lock.
    pub async fn read<T>(&self, f: impl FnOnce(&Document) -> T) -> Result<T> {
        let _guard = self.lock.lock().await;
        let doc = self.store.load().await?;
        Ok(f(&doc))
    }

    /// Load, mutate and save the document as one locked cycle.
    ///
    /// Nothing is written if `load` fails; the in-memory change is dropped if
    /// `save` fails.
    pub async fn update<T>(&self, f: impl FnOnce(&mut Document) -> T) -> Result<T> {
        let _guard = self.lock.lock().await;
        let mut doc = self.store.load().await?;
        let out = f(&mut doc);
        self.store.save(&doc).await?;
        Ok(out)
    }

    /// Subscribe `user` to `channel`. Adding an existing subscription is a no-op.
    pub async fn add(&self, user: &Snowflake, channel: &Snowflake) -> Result<AddOutcome> {
        let outcome = self
            .update(|doc| {
                if doc.record_mut(user).add(channel.clone()) {
                    AddOutcome::Added
                } else {
                    AddOutcome::AlreadySubscribed
                }
            })
            .await?;
        info!(user_id = %user, channel_id = %channel, ?outcome, "subscription added");
        Ok(outcome)
    }

    /// Unsubscribe `user` from `channel`, returning how many entries were dropped.
    ///
    /// The user's record is created if missing, so an unknown user ends up
    /// with an empty list rather than an error.
    pub async fn remove(&self, user: &Snowflake, channel: &Snowflake) -> Result<usize> {
        let removed = self
            .update(|doc| doc.record_mut(user).remove_all(channel))
            .await?;
        info!(user_id = %user, channel_id = %channel, removed, "subscription removed");
        Ok(removed)
    }

    /// Ids of every user subscribed to `channel`.
    pub async fn subscribers_of(&self, channel: &Snowflake) -> Result<Vec<Snowflake>> {
        self.read(|doc| doc.subscribers_of(channel)).await
    }

    pub async fn record(&self, user: &Snowflake) -> Result<Option<SubscriptionRecord>> {
        self.read(|doc| doc.get(user).cloned()).await
    }
}
