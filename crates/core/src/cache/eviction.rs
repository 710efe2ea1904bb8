//! Budget enforcement for a single generation.
//!
//! Runs after every successful write. Sizes come from the value recorded
//! at write time, so the pass is one ordered scan of the entry listing
//! rather than a re-read of every body. Victims are taken strictly in the
//! store's insertion order until the total fits.

use super::snapshots::EntryMeta;
use super::store::CacheStore;
use crate::Error;

/// Outcome of one eviction pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvictionReport {
    pub total_before: u64,
    pub total_after: u64,
    pub evicted: Vec<EntryMeta>,
}

impl EvictionReport {
    pub fn evicted_bytes(&self) -> u64 {
        self.total_before - self.total_after
    }
}

/// Delete entries of `generation`, oldest insertion first, until its total
/// size is at most `budget`.
///
/// An entry that vanished between listing and deletion (a concurrent
/// writer replaced or removed it) still counts as freed.
pub async fn enforce_budget<S>(store: &S, generation: &str, budget: u64) -> Result<EvictionReport, Error>
where
    S: CacheStore + ?Sized,
{
    let entries = store.entries(generation).await?;
    let total_before: u64 = entries.iter().map(|e| e.size_bytes).sum();

    let mut report = EvictionReport { total_before, total_after: total_before, evicted: Vec::new() };
    if total_before <= budget {
        return Ok(report);
    }

    for entry in entries {
        if report.total_after <= budget {
            break;
        }
        if !store.delete(generation, &entry.key_hash).await? {
            tracing::debug!("eviction candidate {} already gone", entry.url);
        }
        report.total_after -= entry.size_bytes;
        report.evicted.push(entry);
    }

    tracing::info!(
        "evicted {} entries ({} bytes) from {}: {} -> {} bytes (budget {})",
        report.evicted.len(),
        report.evicted_bytes(),
        generation,
        report.total_before,
        report.total_after,
        budget
    );

    Ok(report)
}
