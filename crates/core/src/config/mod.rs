//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (SHELLCACHE_*)
//! 2. TOML config file (if SHELLCACHE_CONFIG_FILE set)
//! 3. Built-in defaults
//!
//! The loaded value is immutable: the manager takes it at construction and
//! never mutates it afterwards.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (SHELLCACHE_*)
/// 2. TOML config file (if SHELLCACHE_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to SQLite cache database.
    ///
    /// Set via SHELLCACHE_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Origin that root-relative paths (precache list, fallback) resolve against.
    ///
    /// Set via SHELLCACHE_ORIGIN environment variable.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Name of the current store generation.
    ///
    /// Changing it invalidates every other generation on the next activation.
    #[serde(default = "default_generation")]
    pub generation: String,

    /// Maximum total bytes the current generation may hold after eviction.
    #[serde(default = "default_budget_bytes")]
    pub budget_bytes: u64,

    /// Root-relative paths fetched and stored at install time, in order.
    #[serde(default = "default_precache")]
    pub precache: Vec<String>,

    /// Root-relative path served when the network fails and nothing better is cached.
    ///
    /// Must be a member of `precache`.
    #[serde(default = "default_fallback_path")]
    pub fallback_path: String,

    /// Hostnames served cache-first regardless of path.
    #[serde(default)]
    pub allowlist: AllowList,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via SHELLCACHE_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// HTTP request timeout in milliseconds.
    ///
    /// Set via SHELLCACHE_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Largest single response that may be written to the store.
    ///
    /// Larger responses are still served, just never cached. The effective
    /// limit is clamped to `budget_bytes`, see [`AppConfig::cache_limit`].
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./shellcache.sqlite")
}

fn default_origin() -> String {
    "http://localhost:8080".into()
}

fn default_generation() -> String {
    "app-cache-v1".into()
}

fn default_budget_bytes() -> u64 {
    50 * 1024 * 1024
}

fn default_precache() -> Vec<String> {
    vec!["/index.html".into(), "/".into()]
}

fn default_fallback_path() -> String {
    "/".into()
}

fn default_user_agent() -> String {
    "shellcache/0.1".into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_max_bytes() -> usize {
    10 * 1024 * 1024
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            origin: default_origin(),
            generation: default_generation(),
            budget_bytes: default_budget_bytes(),
            precache: default_precache(),
            fallback_path: default_fallback_path(),
            allowlist: AllowList::default(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            max_bytes: default_max_bytes(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Largest response size, in bytes, that may be stored.
    pub fn cache_limit(&self) -> u64 {
        (self.max_bytes as u64).min(self.budget_bytes)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `SHELLCACHE_`
    /// 2. TOML file from `SHELLCACHE_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_figment(Self::figment())
    }

    /// The layered provider stack used by [`AppConfig::load`].
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("SHELLCACHE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment.merge(
            Env::prefixed("SHELLCACHE_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        )
    }

    /// Extract and validate a configuration from an arbitrary figment.
    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}

/// Allow-list categories recognised by the router.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AllowCategory {
    Fonts,
    MapTiles,
    CdnAssets,
}

impl AllowCategory {
    pub const ALL: [AllowCategory; 3] = [AllowCategory::Fonts, AllowCategory::MapTiles, AllowCategory::CdnAssets];

    pub fn as_str(&self) -> &'static str {
        match self {
            AllowCategory::Fonts => "fonts",
            AllowCategory::MapTiles => "map-tiles",
            AllowCategory::CdnAssets => "cdn-assets",
        }
    }
}

impl fmt::Display for AllowCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Hostnames, grouped by category, whose requests are served cache-first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowList {
    #[serde(default)]
    pub fonts: Vec<String>,
    #[serde(default)]
    pub map_tiles: Vec<String>,
    #[serde(default)]
    pub cdn_assets: Vec<String>,
}

impl Default for AllowList {
    fn default() -> Self {
        Self {
            fonts: vec!["fonts.googleapis.com".into(), "fonts.gstatic.com".into()],
            map_tiles: vec!["tile.openstreetmap.org".into()],
            cdn_assets: vec!["cdn.jsdelivr.net".into(), "cdn.tailwindcss.com".into(), "unpkg.com".into()],
        }
    }
}

impl AllowList {
    /// Hosts configured for a category.
    pub fn hosts(&self, category: AllowCategory) -> &[String] {
        match category {
            AllowCategory::Fonts => &self.fonts,
            AllowCategory::MapTiles => &self.map_tiles,
            AllowCategory::CdnAssets => &self.cdn_assets,
        }
    }

    /// Iterate over every `(category, host)` pair.
    pub fn iter(&self) -> impl Iterator<Item = (AllowCategory, &str)> {
        AllowCategory::ALL
            .into_iter()
            .flat_map(move |category| self.hosts(category).iter().map(move |h| (category, h.as_str())))
    }
}
