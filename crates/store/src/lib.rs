//! Subscription persistence.
//!
//! The whole subscription document lives in one JSON file
//! (`{"<user>": {"subscribed": ["<channel>", ...]}}`). Every access goes
//! through [`Subscriptions`], which holds a single process-wide lock across
//! the full load → mutate → save cycle.

pub mod error;
pub mod store;
pub mod store_file;
pub mod store_memory;
pub mod subscriptions;
pub mod types;

pub use {
    error::{Error, Result},
    store::SubscriptionStore,
    store_file::FileStore,
    store_memory::InMemoryStore,
    subscriptions::{AddOutcome, Subscriptions},
    types::{Document, SubscriptionRecord},
};
