//! Test doubles for tool tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use shellcache_client::{Fetcher, OfflineCacheManager};
use shellcache_core::{AppConfig, CacheDb, CacheRequest, Error, ResponseSnapshot};

/// Serves the app shell for every path until taken offline.
#[derive(Default)]
pub(crate) struct StaticFetcher {
    offline: AtomicBool,
}

impl StaticFetcher {
    pub(crate) fn online() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn go_offline(&self) {
        self.offline.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl Fetcher for StaticFetcher {
    async fn fetch(&self, _request: &CacheRequest) -> Result<ResponseSnapshot, Error> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::Network("offline".into()));
        }
        Ok(ResponseSnapshot::new(200, "<html>shell</html>").with_header("content-type", "text/html"))
    }
}

pub(crate) async fn activated(fetcher: Arc<StaticFetcher>) -> OfflineCacheManager<CacheDb, Arc<StaticFetcher>> {
    let db = CacheDb::open_in_memory().await.unwrap();
    let manager = OfflineCacheManager::new(db, fetcher, AppConfig::default()).unwrap();
    manager.start().await.unwrap();
    manager
}
