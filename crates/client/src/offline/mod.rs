//! Offline cache manager.
//!
//! Sits in front of a [`Fetcher`] and answers intercepted requests from the
//! current store generation or the network:
//!
//! - `lifecycle`: install (precache) and activate (drop stale generations,
//!   take control)
//! - `strategy`: cache-first and network-first execution, fallback
//!   document, write-then-evict
//!
//! Routing itself is the pure [`RouteTable::route`] from core.

mod lifecycle;
mod strategy;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::atomic::{AtomicU8, Ordering};

use futures_util::future::BoxFuture;
use url::Url;

use shellcache_core::{AppConfig, CacheRequest, CacheStore, Error, ResponseSnapshot, RouteTable, Strategy};

use crate::fetch::{Fetcher, canonicalize, resolve_path};

pub use lifecycle::{ActivateReport, InstallReport, LifecycleState};

/// Where a served response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServedFrom {
    Cache,
    Network,
    Fallback,
    PassThrough,
}

impl ServedFrom {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServedFrom::Cache => "cache",
            ServedFrom::Network => "network",
            ServedFrom::Fallback => "fallback",
            ServedFrom::PassThrough => "pass-through",
        }
    }
}

/// A response handed back to the intercepted caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Served {
    pub response: ResponseSnapshot,
    pub source: ServedFrom,
}

impl Served {
    pub fn new(response: ResponseSnapshot, source: ServedFrom) -> Self {
        Self { response, source }
    }
}

/// Decision for one intercepted request.
///
/// `Respond` carries the operation that produces the response; the host
/// must drive it to completion before answering the caller.
pub enum Interception<'a> {
    PassThrough,
    Respond(BoxFuture<'a, Result<Served, Error>>),
}

impl Interception<'_> {
    pub fn is_pass_through(&self) -> bool {
        matches!(self, Interception::PassThrough)
    }
}

/// Store usage snapshot for the current generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStatus {
    pub generation: String,
    pub state: LifecycleState,
    pub entries: usize,
    pub total_bytes: u64,
    pub budget_bytes: u64,
    pub generations: Vec<String>,
}

/// Routes intercepted requests through the current store generation.
///
/// Configuration is fixed at construction.
pub struct OfflineCacheManager<S, F> {
    store: S,
    fetcher: F,
    config: AppConfig,
    routes: RouteTable,
    precache_urls: Vec<Url>,
    fallback_url: Url,
    state: AtomicU8,
}

impl<S, F> OfflineCacheManager<S, F>
where
    S: CacheStore,
    F: Fetcher,
{
    /// Build a manager over `store` and `fetcher`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if `config` fails validation and
    /// `Error::InvalidUrl` if a configured path cannot be resolved.
    pub fn new(store: S, fetcher: F, config: AppConfig) -> Result<Self, Error> {
        config.validate()?;
        let routes = RouteTable::from_config(&config)?;

        let origin = canonicalize(&config.origin).map_err(|e| Error::InvalidUrl(e.to_string()))?;
        let precache_urls = config
            .precache
            .iter()
            .map(|path| resolve_path(&origin, path))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| Error::InvalidUrl(e.to_string()))?;
        let fallback_url =
            resolve_path(&origin, &config.fallback_path).map_err(|e| Error::InvalidUrl(e.to_string()))?;

        Ok(Self {
            store,
            fetcher,
            config,
            routes,
            precache_urls,
            fallback_url,
            state: AtomicU8::new(LifecycleState::Pending as u8),
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn generation(&self) -> &str {
        &self.config.generation
    }

    pub fn state(&self) -> LifecycleState {
        LifecycleState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn set_state(&self, state: LifecycleState) {
        self.state.store(state as u8, Ordering::Release);
    }

    /// Whether the manager has claimed clients and intercepts requests.
    pub fn is_controlling(&self) -> bool {
        self.state() == LifecycleState::Activated
    }

    /// Decide how to serve `request`.
    ///
    /// Nothing is read or written until the returned future is polled.
    pub fn intercept<'a>(&'a self, request: &'a CacheRequest) -> Interception<'a> {
        if !self.is_controlling() {
            tracing::debug!("not controlling yet, passing through {} {}", request.method, request.url);
            return Interception::PassThrough;
        }

        let strategy = self.routes.route(&request.method, &request.url);
        tracing::debug!("{} {} -> {}", request.method, request.url, strategy.as_str());

        match strategy {
            Strategy::PassThrough => Interception::PassThrough,
            Strategy::CacheFirst => Interception::Respond(Box::pin(self.cache_first(request))),
            Strategy::NetworkFirst => Interception::Respond(Box::pin(self.network_first(request))),
        }
    }

    /// Intercept and await the outcome, fetching directly on pass-through.
    pub async fn handle(&self, request: &CacheRequest) -> Result<Served, Error> {
        match self.intercept(request) {
            Interception::Respond(response) => response.await,
            Interception::PassThrough => {
                let response = self.fetcher.fetch(request).await?;
                Ok(Served::new(response, ServedFrom::PassThrough))
            }
        }
    }

    /// Usage of the current generation plus every generation on disk.
    pub async fn status(&self) -> Result<CacheStatus, Error> {
        let entries = self.store.entries(self.generation()).await?;
        let generations = self.store.generations().await?;

        Ok(CacheStatus {
            generation: self.generation().to_string(),
            state: self.state(),
            entries: entries.len(),
            total_bytes: entries.iter().map(|e| e.size_bytes).sum(),
            budget_bytes: self.config.budget_bytes,
            generations,
        })
    }
}
