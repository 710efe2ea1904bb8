//! Client code for shellcache.
//!
//! This crate provides the network fetch pipeline and the offline cache
//! manager that decides, per intercepted request, whether to answer from
//! the store or the network.

pub mod fetch;
pub mod offline;

pub use fetch::{Fetcher, HttpFetcher, HttpFetcherConfig, canonicalize, resolve_path};
pub use offline::{
    ActivateReport, CacheStatus, InstallReport, Interception, LifecycleState, OfflineCacheManager, Served, ServedFrom,
};
