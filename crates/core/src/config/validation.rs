//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use std::collections::HashMap;

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `generation` or `user_agent` is empty
    /// - `budget_bytes` or `max_bytes` is 0
    /// - `origin` is not an absolute http(s) URL with a host
    /// - a precache path or `fallback_path` is not root-relative
    /// - `fallback_path` is not precached
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - an allow-list hostname is empty or contains a path
    ///
    /// Returns `ConfigError::Missing` if the precache list is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.generation.trim().is_empty() {
            return Err(invalid("generation", "must not be empty"));
        }

        if self.budget_bytes == 0 {
            return Err(invalid("budget_bytes", "must be greater than 0"));
        }

        if self.max_bytes == 0 {
            return Err(invalid("max_bytes", "must be greater than 0"));
        }

        let origin = url::Url::parse(&self.origin).map_err(|e| invalid("origin", e.to_string()))?;
        if !matches!(origin.scheme(), "http" | "https") {
            return Err(invalid("origin", format!("unsupported scheme: {}", origin.scheme())));
        }
        if origin.host_str().is_none() {
            return Err(invalid("origin", "must include a host"));
        }

        if self.precache.is_empty() {
            return Err(ConfigError::Missing {
                field: "precache".into(),
                hint: "list at least the offline entry document, e.g. \"/\"".into(),
            });
        }
        if let Some(path) = self.precache.iter().find(|p| !p.starts_with('/')) {
            return Err(invalid("precache", format!("path must be root-relative: {path}")));
        }

        if !self.fallback_path.starts_with('/') {
            return Err(invalid("fallback_path", "must be root-relative"));
        }
        if !self.precache.contains(&self.fallback_path) {
            return Err(invalid("fallback_path", format!("{} is not in the precache list", self.fallback_path)));
        }

        if self.timeout_ms < 100 {
            return Err(invalid("timeout_ms", "must be at least 100ms"));
        }
        if self.timeout_ms > 300_000 {
            return Err(invalid("timeout_ms", "must not exceed 5 minutes (300000ms)"));
        }

        if self.user_agent.is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }

        let mut seen = HashMap::new();
        for (category, host) in self.allowlist.iter() {
            if host.trim().is_empty() || host.contains('/') {
                return Err(invalid(
                    &format!("allowlist.{}", category.as_str().replace('-', "_")),
                    format!("not a bare hostname: {host:?}"),
                ));
            }
            if let Some(previous) = seen.insert(host.to_ascii_lowercase(), category)
                && previous != category
            {
                tracing::warn!("allow-list host {} appears in both {} and {}", host, previous, category);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AllowList;

    #[test]
    fn test_validate_default_config() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_empty_generation() {
        let config = AppConfig { generation: "  ".into(), ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "generation"));
    }

    #[test]
    fn test_validate_zero_budget() {
        let config = AppConfig { budget_bytes: 0, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "budget_bytes"));
    }

    #[test]
    fn test_validate_max_bytes_above_budget_is_clamped() {
        let config = AppConfig { budget_bytes: 1024, max_bytes: 2048, ..Default::default() };
        assert!(config.validate().is_ok());
        assert_eq!(config.cache_limit(), 1024);
    }

    #[test]
    fn test_validate_zero_max_bytes() {
        let config = AppConfig { max_bytes: 0, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "max_bytes"));
    }

    #[test]
    fn test_validate_origin_scheme() {
        let config = AppConfig { origin: "ftp://example.com".into(), ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "origin"));
    }

    #[test]
    fn test_validate_origin_unparseable() {
        let config = AppConfig { origin: "localhost".into(), ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "origin"));
    }

    #[test]
    fn test_validate_empty_precache() {
        let config = AppConfig { precache: Vec::new(), ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Missing { field, .. }) if field == "precache"));
    }

    #[test]
    fn test_validate_relative_precache_path() {
        let config = AppConfig { precache: vec!["/".into(), "index.html".into()], ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "precache"));
    }

    #[test]
    fn test_validate_fallback_not_precached() {
        let config = AppConfig { fallback_path: "/offline.html".into(), ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "fallback_path"));
    }

    #[test]
    fn test_validate_timeout_bounds() {
        let config = AppConfig { timeout_ms: 50, ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { field, .. }) if field == "timeout_ms"));

        let config = AppConfig { timeout_ms: 301_000, ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { field, .. }) if field == "timeout_ms"));

        let config = AppConfig { timeout_ms: 100, ..Default::default() };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_empty_user_agent() {
        let config = AppConfig { user_agent: String::new(), ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "user_agent"));
    }

    #[test]
    fn test_validate_allowlist_host_with_path() {
        let allowlist = AllowList { map_tiles: vec!["tile.openstreetmap.org/0".into()], ..Default::default() };
        let config = AppConfig { allowlist, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "allowlist.map_tiles"));
    }

    #[test]
    fn test_validate_duplicate_host_is_allowed() {
        let allowlist = AllowList { cdn_assets: vec!["fonts.gstatic.com".into()], ..Default::default() };
        let config = AppConfig { allowlist, ..Default::default() };
        assert!(config.validate().is_ok());
    }
}
