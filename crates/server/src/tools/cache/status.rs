//! cache_status tool implementation.
//!
//! Reports lifecycle state and store usage for the current generation.

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shellcache_client::{Fetcher, OfflineCacheManager};
use shellcache_core::{CacheStore, EntryMeta};

use crate::error::ToolError;

/// Output from the cache_status tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheStatusOutput {
    /// Current store generation name.
    pub generation: String,
    /// pending, installed or activated.
    pub state: String,
    pub entries: usize,
    pub total_bytes: u64,
    pub budget_bytes: u64,
    /// Every generation present on disk.
    pub generations: Vec<String>,
    /// Entries of the current generation, in eviction order.
    pub listing: Vec<EntryMeta>,
}

/// Implementation of the cache_status tool.
pub async fn status_impl<S, F>(manager: &OfflineCacheManager<S, F>) -> Result<CallToolResult, McpError>
where
    S: CacheStore,
    F: Fetcher,
{
    let status = manager.status().await?;
    let listing = manager.store().entries(manager.generation()).await?;

    let output = CacheStatusOutput {
        generation: status.generation,
        state: status.state.to_string(),
        entries: status.entries,
        total_bytes: status.total_bytes,
        budget_bytes: status.budget_bytes,
        generations: status.generations,
        listing,
    };

    let json = serde_json::to_string_pretty(&output)
        .map_err(|e| ToolError::Output(format!("Failed to serialize output: {e}")))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::cache::testing::{StaticFetcher, activated};

    #[tokio::test]
    async fn test_status_after_start() {
        let manager = activated(StaticFetcher::online()).await;

        let result = status_impl(&manager).await.unwrap();
        let content_val = serde_json::to_value(&result.content[0]).unwrap();
        let text = content_val
            .get("text")
            .and_then(|v| v.as_str())
            .expect("Expected text field in content");
        let output: CacheStatusOutput = serde_json::from_str(text).unwrap();

        assert_eq!(output.generation, "app-cache-v1");
        assert_eq!(output.state, "activated");
        assert_eq!(output.entries, 2);
        assert_eq!(output.listing.len(), 2);
        assert_eq!(output.listing[0].url, "http://localhost:8080/index.html");
        assert_eq!(output.total_bytes, output.listing.iter().map(|e| e.size_bytes).sum::<u64>());
    }
}
