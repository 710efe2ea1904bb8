//! Pure routing: maps request metadata to a caching strategy.
//!
//! No I/O happens here; the manager executes whatever [`Strategy`] this
//! returns.

use std::collections::{HashMap, HashSet};

use url::{Origin, Url};

use crate::config::{AllowCategory, AppConfig, ConfigError};

/// How an intercepted request is served.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Serve from the current generation if present, otherwise fetch and populate.
    CacheFirst,
    /// Fetch; fall back to the cached fallback document on transport failure.
    NetworkFirst,
    /// Do not intervene.
    PassThrough,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::CacheFirst => "cache-first",
            Strategy::NetworkFirst => "network-first",
            Strategy::PassThrough => "pass-through",
        }
    }
}

/// Precomputed lookup tables for [`RouteTable::route`].
#[derive(Debug, Clone)]
pub struct RouteTable {
    origin: Origin,
    precache: HashSet<String>,
    hosts: HashMap<String, AllowCategory>,
}

impl RouteTable {
    pub fn from_config(config: &AppConfig) -> Result<Self, ConfigError> {
        let origin = Url::parse(&config.origin)
            .map_err(|e| ConfigError::Invalid { field: "origin".into(), reason: e.to_string() })?
            .origin();

        let precache = config.precache.iter().cloned().collect();

        let mut hosts = HashMap::new();
        for (category, host) in config.allowlist.iter() {
            hosts.entry(host.to_ascii_lowercase()).or_insert(category);
        }

        Ok(Self { origin, precache, hosts })
    }

    /// Allow-list category of a hostname, if any.
    pub fn category(&self, host: &str) -> Option<AllowCategory> {
        self.hosts.get(&host.to_ascii_lowercase()).copied()
    }

    /// Whether `url` is an application-origin URL whose path is precached.
    pub fn is_precached(&self, url: &Url) -> bool {
        url.origin() == self.origin && self.precache.contains(url.path())
    }

    /// Pick the strategy for a request.
    pub fn route(&self, method: &str, url: &Url) -> Strategy {
        if !method.eq_ignore_ascii_case("GET") {
            return Strategy::PassThrough;
        }

        if self.is_precached(url) {
            return Strategy::CacheFirst;
        }

        if let Some(host) = url.host_str()
            && self.category(host).is_some()
        {
            return Strategy::CacheFirst;
        }

        Strategy::NetworkFirst
    }
}
