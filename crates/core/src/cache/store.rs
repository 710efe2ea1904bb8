//! Store abstraction used by the offline cache manager and eviction.
//!
//! ## Ordering contract
//!
//! [`CacheStore::entries`] returns a generation's entries in insertion
//! order, and that order is stable across calls and restarts. Replacing an
//! existing key counts as a new insertion: the entry moves to the end.
//! Eviction relies on this order.

use async_trait::async_trait;

use super::connection::CacheDb;
use super::snapshots::{EntryMeta, ResponseSnapshot};
use crate::Error;
use crate::request::RequestKey;

/// Persistent, generation-partitioned response store.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Create `generation` if absent.
    async fn open(&self, generation: &str) -> Result<(), Error>;

    /// Every generation name currently stored.
    async fn generations(&self) -> Result<Vec<String>, Error>;

    /// Remove a whole generation. Returns whether it existed.
    async fn delete_generation(&self, generation: &str) -> Result<bool, Error>;

    async fn lookup(&self, generation: &str, key: &RequestKey) -> Result<Option<ResponseSnapshot>, Error>;

    async fn put(&self, generation: &str, key: &RequestKey, response: &ResponseSnapshot) -> Result<(), Error>;

    /// Write all entries or none, in the given order.
    async fn put_all(&self, generation: &str, entries: Vec<(RequestKey, ResponseSnapshot)>) -> Result<(), Error>;

    /// Delete one entry by [`RequestKey::hash`]. Returns whether it existed.
    async fn delete(&self, generation: &str, key_hash: &str) -> Result<bool, Error>;

    /// Entries of `generation` in insertion order.
    async fn entries(&self, generation: &str) -> Result<Vec<EntryMeta>, Error>;
}

#[async_trait]
impl CacheStore for CacheDb {
    async fn open(&self, generation: &str) -> Result<(), Error> {
        self.open_generation(generation).await
    }

    async fn generations(&self) -> Result<Vec<String>, Error> {
        self.generation_names().await
    }

    async fn delete_generation(&self, generation: &str) -> Result<bool, Error> {
        CacheDb::delete_generation(self, generation).await
    }

    async fn lookup(&self, generation: &str, key: &RequestKey) -> Result<Option<ResponseSnapshot>, Error> {
        self.lookup_entry(generation, key).await
    }

    async fn put(&self, generation: &str, key: &RequestKey, response: &ResponseSnapshot) -> Result<(), Error> {
        self.put_entry(generation, key, response).await
    }

    async fn put_all(&self, generation: &str, entries: Vec<(RequestKey, ResponseSnapshot)>) -> Result<(), Error> {
        self.put_entries(generation, entries).await
    }

    async fn delete(&self, generation: &str, key_hash: &str) -> Result<bool, Error> {
        self.delete_entry(generation, key_hash).await
    }

    async fn entries(&self, generation: &str) -> Result<Vec<EntryMeta>, Error> {
        self.list_entries(generation).await
    }
}
