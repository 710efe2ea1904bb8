//! Intercepted request model and its cache identity.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::cache::hash::compute_cache_key;

/// A request as seen at the interception boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheRequest {
    /// Upper-cased HTTP method.
    pub method: String,
    pub url: Url,
    pub headers: Vec<(String, String)>,
}

impl CacheRequest {
    pub fn new(method: &str, url: Url) -> Self {
        Self { method: method.trim().to_ascii_uppercase(), url, headers: Vec::new() }
    }

    pub fn get(url: Url) -> Self {
        Self::new("GET", url)
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn is_get(&self) -> bool {
        self.method == "GET"
    }

    /// Store identity of this request.
    pub fn key(&self) -> RequestKey {
        RequestKey::new(&self.method, &self.url)
    }
}

/// Normalized request identity: method plus URL without fragment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestKey {
    pub method: String,
    pub url: String,
}

impl RequestKey {
    pub fn new(method: &str, url: &Url) -> Self {
        let mut url = url.clone();
        url.set_fragment(None);
        Self { method: method.trim().to_ascii_uppercase(), url: url.into() }
    }

    /// Hex SHA-256 used as the row key in the store.
    pub fn hash(&self) -> String {
        compute_cache_key(&self.method, &self.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_method_is_uppercased() {
        let req = CacheRequest::new(" get ", url("https://example.com/"));
        assert_eq!(req.method, "GET");
        assert!(req.is_get());
        assert!(!CacheRequest::new("post", url("https://example.com/")).is_get());
    }

    #[test]
    fn test_key_ignores_fragment() {
        let a = CacheRequest::get(url("https://example.com/app#top")).key();
        let b = CacheRequest::get(url("https://example.com/app")).key();
        assert_eq!(a, b);
        assert_eq!(a.hash(), b.hash());
    }

    #[test]
    fn test_key_keeps_query() {
        let a = CacheRequest::get(url("https://example.com/tile?z=1")).key();
        let b = CacheRequest::get(url("https://example.com/tile?z=2")).key();
        assert_ne!(a.hash(), b.hash());
    }

    #[test]
    fn test_key_distinguishes_method() {
        let u = url("https://example.com/");
        assert_ne!(RequestKey::new("GET", &u).hash(), RequestKey::new("HEAD", &u).hash());
    }
}
