//! Core types and shared functionality for shellcache.
//!
//! This crate provides:
//! - Generation-scoped response store with SQLite backend
//! - Budget-driven eviction over that store
//! - The pure request routing function
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod request;
pub mod router;

pub use cache::{CacheDb, CacheStore, EntryMeta, EvictionReport, ResponseSnapshot, enforce_budget};
pub use config::{AllowCategory, AllowList, AppConfig, ConfigError};
pub use error::Error;
pub use request::{CacheRequest, RequestKey};
pub use router::{RouteTable, Strategy};
