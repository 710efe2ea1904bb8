//! Scripted collaborators for manager tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use url::Url;

use shellcache_core::{AppConfig, CacheDb, CacheRequest, CacheStore, EntryMeta, Error, RequestKey, ResponseSnapshot};

use super::OfflineCacheManager;
use crate::fetch::Fetcher;

pub(crate) fn app_url(path: &str) -> Url {
    Url::parse("http://localhost:8080").unwrap().join(path).unwrap()
}

/// Fetcher answering from a per-URL script and recording every call.
///
/// Unscripted URLs answer 404.
#[derive(Default)]
pub(crate) struct ScriptedFetcher {
    script: Mutex<HashMap<String, Option<ResponseSnapshot>>>,
    calls: Mutex<Vec<String>>,
    offline: AtomicBool,
}

impl ScriptedFetcher {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Scripted with the default precache list.
    pub(crate) fn with_app_shell() -> Arc<Self> {
        let fetcher = Self::new();
        fetcher.respond(&app_url("/index.html"), ResponseSnapshot::new(200, "<html>index</html>"));
        fetcher.respond(
            &app_url("/"),
            ResponseSnapshot::new(200, "<html>app shell</html>").with_header("content-type", "text/html"),
        );
        fetcher
    }

    pub(crate) fn respond(&self, url: &Url, response: ResponseSnapshot) {
        self.script.lock().unwrap().insert(url.to_string(), Some(response));
    }

    /// Make `url` fail at the transport level.
    pub(crate) fn fail(&self, url: &Url) {
        self.script.lock().unwrap().insert(url.to_string(), None);
    }

    pub(crate) fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub(crate) fn calls_for(&self, url: &Url) -> usize {
        let url = url.to_string();
        self.calls.lock().unwrap().iter().filter(|c| **c == url).count()
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, request: &CacheRequest) -> Result<ResponseSnapshot, Error> {
        let url = request.url.to_string();
        self.calls.lock().unwrap().push(url.clone());

        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::Network("offline".into()));
        }

        match self.script.lock().unwrap().get(&url) {
            Some(Some(response)) => Ok(response.clone()),
            Some(None) => Err(Error::Network(format!("dns error for {url}"))),
            None => Ok(ResponseSnapshot::new(404, "not found")),
        }
    }
}

/// Store whose writes can be made to fail; counts reads and writes.
#[derive(Clone)]
pub(crate) struct FailingStore {
    inner: CacheDb,
    fail_puts: Arc<AtomicBool>,
    lookups: Arc<AtomicUsize>,
    puts: Arc<AtomicUsize>,
}

impl FailingStore {
    pub(crate) fn new(inner: CacheDb) -> Self {
        Self {
            inner,
            fail_puts: Arc::new(AtomicBool::new(false)),
            lookups: Arc::new(AtomicUsize::new(0)),
            puts: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub(crate) fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    pub(crate) fn puts(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    pub(crate) fn fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn inner(&self) -> &CacheDb {
        &self.inner
    }

    fn check(&self) -> Result<(), Error> {
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(Error::InvalidInput("quota exceeded".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl CacheStore for FailingStore {
    async fn open(&self, generation: &str) -> Result<(), Error> {
        CacheStore::open(&self.inner, generation).await
    }

    async fn generations(&self) -> Result<Vec<String>, Error> {
        self.inner.generations().await
    }

    async fn delete_generation(&self, generation: &str) -> Result<bool, Error> {
        CacheStore::delete_generation(&self.inner, generation).await
    }

    async fn lookup(&self, generation: &str, key: &RequestKey) -> Result<Option<ResponseSnapshot>, Error> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.inner.lookup(generation, key).await
    }

    async fn put(&self, generation: &str, key: &RequestKey, response: &ResponseSnapshot) -> Result<(), Error> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.inner.put(generation, key, response).await
    }

    async fn put_all(&self, generation: &str, entries: Vec<(RequestKey, ResponseSnapshot)>) -> Result<(), Error> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.inner.put_all(generation, entries).await
    }

    async fn delete(&self, generation: &str, key_hash: &str) -> Result<bool, Error> {
        self.inner.delete(generation, key_hash).await
    }

    async fn entries(&self, generation: &str) -> Result<Vec<EntryMeta>, Error> {
        self.inner.entries(generation).await
    }
}

/// An installed and activated manager over an in-memory store.
pub(crate) async fn activated(
    config: AppConfig,
) -> (OfflineCacheManager<CacheDb, Arc<ScriptedFetcher>>, CacheDb, Arc<ScriptedFetcher>) {
    let db = CacheDb::open_in_memory().await.unwrap();
    let fetcher = ScriptedFetcher::with_app_shell();
    let manager = OfflineCacheManager::new(db.clone(), fetcher.clone(), config).unwrap();
    manager.start().await.unwrap();
    (manager, db, fetcher)
}
