//! SQLite-backed, generation-scoped response store.
//!
//! This module provides the persistent store the offline cache manager
//! reads from and writes to, with async access via tokio-rusqlite. It
//! supports:
//!
//! - Named store generations, with whole-generation deletion
//! - Request-identity keys using SHA-256 hashing
//! - Stable insertion-order enumeration
//! - Budget-driven eviction in that order
//! - Automatic schema migrations
//! - WAL mode for concurrent access

pub mod connection;
pub mod eviction;
pub mod generations;
pub mod hash;
pub mod migrations;
pub mod snapshots;
pub mod store;

pub use crate::Error;

pub use connection::CacheDb;
pub use eviction::{EvictionReport, enforce_budget};
pub use snapshots::{EntryMeta, ResponseSnapshot};
pub use store::CacheStore;
