//! Cache-first and network-first execution.

use shellcache_core::{CacheRequest, CacheStore, Error, RequestKey, ResponseSnapshot, enforce_budget};

use super::{OfflineCacheManager, Served, ServedFrom};
use crate::fetch::Fetcher;

impl<S, F> OfflineCacheManager<S, F>
where
    S: CacheStore,
    F: Fetcher,
{
    /// Serve from the current generation; on a miss fetch, store 2xx
    /// responses no larger than the cache limit and return whatever the
    /// network said.
    ///
    /// Stored entries never expire.
    pub(crate) async fn cache_first(&self, request: &CacheRequest) -> Result<Served, Error> {
        let key = request.key();
        if let Some(cached) = self.store.lookup(self.generation(), &key).await? {
            tracing::debug!("cache hit for {}", request.url);
            return Ok(Served::new(cached, ServedFrom::Cache));
        }

        tracing::debug!("cache miss for {}", request.url);
        match self.fetcher.fetch(request).await {
            Ok(response) => {
                if !response.is_ok() {
                    tracing::debug!("not caching {} (status {})", request.url, response.status);
                } else if response.size_bytes() > self.config.cache_limit() {
                    tracing::debug!("not caching {} ({} bytes over limit)", request.url, response.size_bytes());
                } else {
                    self.store_and_evict(&key, &response).await;
                }
                Ok(Served::new(response, ServedFrom::Network))
            }
            Err(err) if err.is_network() => self.serve_fallback(request, err).await,
            Err(err) => Err(err),
        }
    }

    /// Fetch; only consult the store when the network itself fails.
    pub(crate) async fn network_first(&self, request: &CacheRequest) -> Result<Served, Error> {
        match self.fetcher.fetch(request).await {
            Ok(response) => Ok(Served::new(response, ServedFrom::Network)),
            Err(err) if err.is_network() => self.serve_fallback(request, err).await,
            Err(err) => Err(err),
        }
    }

    /// Answer with the cached fallback document, or hand back `err` if
    /// there is none.
    async fn serve_fallback(&self, request: &CacheRequest, err: Error) -> Result<Served, Error> {
        let key = RequestKey::new("GET", &self.fallback_url);
        match self.store.lookup(self.generation(), &key).await {
            Ok(Some(document)) => {
                tracing::warn!("{} failed ({}), serving fallback {}", request.url, err, self.fallback_url);
                Ok(Served::new(document, ServedFrom::Fallback))
            }
            Ok(None) => {
                tracing::warn!("{} failed ({}) and no fallback is cached", request.url, err);
                Err(err)
            }
            Err(store_err) => {
                tracing::warn!("{} failed ({}), fallback lookup failed: {}", request.url, err, store_err);
                Err(err)
            }
        }
    }

    /// Best-effort write followed by an eviction pass.
    ///
    /// Failures are logged; the caller still gets the network response.
    async fn store_and_evict(&self, key: &RequestKey, response: &ResponseSnapshot) -> bool {
        let generation = self.generation();
        if let Err(e) = self.store.put(generation, key, response).await {
            tracing::warn!("failed to cache {}: {}", key.url, e);
            return false;
        }

        if let Err(e) = enforce_budget(&self.store, generation, self.config.budget_bytes).await {
            tracing::warn!("eviction after caching {} failed: {}", key.url, e);
        }
        true
    }
}
