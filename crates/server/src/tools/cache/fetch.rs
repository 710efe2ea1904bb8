//! cache_fetch tool implementation.
//!
//! Routes a request through the offline cache manager exactly as an
//! intercepted page request would be.

use chrono::Utc;
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shellcache_client::{Fetcher, OfflineCacheManager, canonicalize};
use shellcache_core::{CacheRequest, CacheStore};

use crate::error::ToolError;

/// Parameters for the cache_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheFetchParams {
    /// The URL to request.
    pub url: String,

    /// HTTP method (default: GET). Anything but GET bypasses the cache.
    #[serde(default = "default_method")]
    pub method: String,
}

fn default_method() -> String {
    "GET".into()
}

/// Output from the cache_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheFetchOutput {
    /// The canonical URL requested.
    pub url: String,
    pub method: String,
    /// HTTP status of the served response.
    pub status: u16,
    /// One of cache, network, fallback, pass-through.
    pub source: String,
    pub content_type: Option<String>,
    /// Body length in bytes.
    pub bytes: usize,
    /// Body decoded as UTF-8 (lossy).
    pub body: String,
    /// ISO8601 timestamp of when the response was served.
    pub served_at: String,
}

/// Implementation of the cache_fetch tool.
pub async fn fetch_impl<S, F>(
    manager: &OfflineCacheManager<S, F>, params: CacheFetchParams,
) -> Result<CallToolResult, McpError>
where
    S: CacheStore,
    F: Fetcher,
{
    if params.url.trim().is_empty() {
        return Err(ToolError::InvalidInput("url cannot be empty".into()).into());
    }
    if params.method.trim().is_empty() {
        return Err(ToolError::InvalidInput("method cannot be empty".into()).into());
    }

    let url = canonicalize(&params.url).map_err(|e| ToolError::InvalidInput(e.to_string()))?;
    let request = CacheRequest::new(&params.method, url);

    let served = manager.handle(&request).await?;

    let output = CacheFetchOutput {
        url: request.url.to_string(),
        method: request.method.clone(),
        status: served.response.status,
        source: served.source.as_str().to_string(),
        content_type: served.response.content_type().map(str::to_string),
        bytes: served.response.body.len(),
        body: String::from_utf8_lossy(&served.response.body).into_owned(),
        served_at: Utc::now().to_rfc3339(),
    };

    let json = serde_json::to_string_pretty(&output)
        .map_err(|e| ToolError::Output(format!("Failed to serialize output: {e}")))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}
