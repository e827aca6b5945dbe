//! Persistence trait for the subscription document.

use async_trait::async_trait;

use crate::{Result, types::Document};

/// Whole-document persistence backend.
///
/// Implementations do no locking of their own; callers serialize access
/// through [`crate::Subscriptions`].
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// Read the durable document. A missing document is initialized empty.
    async fn load(&self) -> Result<Document>;

    /// Replace the durable document with `doc`.
    async fn save(&self, doc: &Document) -> Result<()>;
}
