//! Install and activate.
//!
//! Install precaches every configured path all-or-nothing. Activation drops
//! every generation other than the current one and starts intercepting.

use std::fmt;
use std::sync::atomic::Ordering;

use futures_util::future::try_join_all;

use shellcache_core::{CacheRequest, CacheStore, Error, enforce_budget};

use super::OfflineCacheManager;
use crate::fetch::Fetcher;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum LifecycleState {
    /// Not installed; every request passes through.
    Pending = 0,
    /// Precache written; may activate at once.
    Installed = 1,
    /// Stale generations purged; requests are intercepted.
    Activated = 2,
}

impl LifecycleState {
    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            1 => LifecycleState::Installed,
            2 => LifecycleState::Activated,
            _ => LifecycleState::Pending,
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecycleState::Pending => "pending",
            LifecycleState::Installed => "installed",
            LifecycleState::Activated => "activated",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    pub generation: String,
    pub assets: usize,
    pub bytes: u64,
    pub evicted: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivateReport {
    pub generation: String,
    /// Stale generations removed, in store order.
    pub deleted: Vec<String>,
}

impl<S, F> OfflineCacheManager<S, F>
where
    S: CacheStore,
    F: Fetcher,
{
    /// Open the current generation and precache every configured path.
    ///
    /// All paths are fetched concurrently. If any fetch fails or returns a
    /// non-2xx status, nothing is written and the state is left unchanged.
    /// A successful install does not wait for older instances: activation
    /// may follow immediately.
    ///
    /// # Errors
    ///
    /// Returns `Error::InstallFailed` naming the first failing asset, or a
    /// store error if the batch write fails.
    pub async fn install(&self) -> Result<InstallReport, Error> {
        let generation = self.generation();
        self.store.open(generation).await?;

        let fetches = self.precache_urls.iter().map(|url| async move {
            let request = CacheRequest::get(url.clone());
            let response = self
                .fetcher
                .fetch(&request)
                .await
                .map_err(|e| Error::InstallFailed(format!("{url}: {e}")))?;
            if !response.is_ok() {
                return Err(Error::InstallFailed(format!("{url}: status {}", response.status)));
            }
            Ok::<_, Error>((request.key(), response))
        });

        let entries = match try_join_all(fetches).await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::error!("install of {} aborted: {}", generation, e);
                return Err(e);
            }
        };

        let assets = entries.len();
        let bytes: u64 = entries.iter().map(|(_, response)| response.size_bytes()).sum();
        self.store.put_all(generation, entries).await?;

        let evicted = match enforce_budget(&self.store, generation, self.config.budget_bytes).await {
            Ok(report) => report.evicted.len(),
            Err(e) => {
                tracing::warn!("eviction after install of {} failed: {}", generation, e);
                0
            }
        };

        let _ = self.state.compare_exchange(
            LifecycleState::Pending as u8,
            LifecycleState::Installed as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
        tracing::info!("installed {} ({} assets, {} bytes), skipping wait", generation, assets, bytes);

        Ok(InstallReport { generation: generation.to_string(), assets, bytes, evicted })
    }

    /// Delete every generation except the current one and take control of
    /// all clients.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidState` if called before a successful install.
    pub async fn activate(&self) -> Result<ActivateReport, Error> {
        let state = self.state();
        if state == LifecycleState::Pending {
            return Err(Error::InvalidState(format!("cannot activate from {state}")));
        }

        let current = self.generation();
        let mut deleted = Vec::new();
        for name in self.store.generations().await? {
            if name == current {
                continue;
            }
            if self.store.delete_generation(&name).await? {
                tracing::info!("deleted stale generation {}", name);
                deleted.push(name);
            }
        }

        self.set_state(LifecycleState::Activated);
        tracing::info!("activated {}, controlling all clients", current);

        Ok(ActivateReport { generation: current.to_string(), deleted })
    }

    /// Install, then activate.
    pub async fn start(&self) -> Result<ActivateReport, Error> {
        self.install().await?;
        self.activate().await
    }
}
