//! MCP tool implementations.
//!
//! This module contains all tools exposed by the shellcache server.
#![allow(unused_imports)]

pub mod cache;

pub use cache::{CacheFetchOutput, CacheFetchParams, CacheStatusOutput};
