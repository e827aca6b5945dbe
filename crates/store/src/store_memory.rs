//! In-memory store for testing.

use std::sync::{
    Mutex,
    atomic::{AtomicBool, Ordering},
};

use async_trait::async_trait;

use crate::{Error, Result, store::SubscriptionStore, types::Document};

/// In-memory store without persistence, for tests.
///
/// `fail_reads` / `fail_writes` make `load` / `save` fail.
#[derive(Default)]
pub struct InMemoryStore {
    doc: Mutex<Document>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(doc: Document) -> Self {
        Self {
            doc: Mutex::new(doc),
            ..Self::default()
        }
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::Relaxed);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::Relaxed);
    }

    /// Current document, bypassing the subscription lock.
    pub fn snapshot(&self) -> Document {
        self.doc.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl SubscriptionStore for InMemoryStore {
    async fn load(&self) -> Result<Document> {
        if self.fail_reads.load(Ordering::Relaxed) {
            return Err(Error::message("read refused by test store"));
        }
        Ok(self.snapshot())
    }

    async fn save(&self, doc: &Document) -> Result<()> {
        if self.fail_writes.load(Ordering::Relaxed) {
            return Err(Error::message("write refused by test store"));
        }
        *self.doc.lock().unwrap_or_else(|e| e.into_inner()) = doc.clone();
        Ok(())
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, courier_common::Snowflake};

    #[tokio::test]
    async fn save_load_roundtrip() {
        let store = InMemoryStore::new();
        let user: Snowflake = "1".parse().unwrap();

        let mut doc = store.load().await.unwrap();
        doc.record_mut(&user).add("2".parse().unwrap());
        store.save(&doc).await.unwrap();

        assert_eq!(store.load().await.unwrap(), doc);
    }

    #[tokio::test]
    async fn failing_writes_keep_previous_document() {
        let store = InMemoryStore::new();
        store.set_fail_writes(true);

        let mut doc = Document::new();
        doc.record_mut("1");
        assert!(store.save(&doc).await.is_err());
        assert!(store.snapshot().is_empty());
    }

    #[tokio::test]
    async fn failing_reads() {
        let store = InMemoryStore::new();
        store.set_fail_reads(true);
        assert!(store.load().await.is_err());
    }
}
