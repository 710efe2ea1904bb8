//! Cache-related MCP tools.
//!
//! This module provides tools for routing requests through the offline
//! cache manager and inspecting the store.

pub mod fetch;
pub mod status;

pub use fetch::{CacheFetchOutput, CacheFetchParams, fetch_impl};
pub use status::{CacheStatusOutput, status_impl};

#[cfg(test)]
pub(crate) mod testing;
