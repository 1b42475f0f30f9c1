//! Client configuration
//!
//! [`ClientConfig`] is the serializable form of everything the client can be
//! tuned with. It can be loaded from YAML, and every field has a default so a
//! partial (or empty) document is valid.

use crate::error::{Error, Result, ResultExt};
use crate::http::{HttpClientConfig, MemoryCache, RateLimiterConfig, RetryPolicy};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Public Gutendex endpoint
pub const DEFAULT_BASE_URL: &str = "https://gutendex.com";

// ============================================================================
// Top-Level Client Config
// ============================================================================

/// Complete client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// API root, e.g. `https://gutendex.com`
    pub base_url: String,

    /// User agent sent with every request
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,

    /// Rate limit, `None` disables admission control
    pub rate_limit: Option<RateLimiterConfig>,

    /// Retry behavior
    pub retry: RetryConfig,

    /// Response cache
    pub cache: CacheConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: None,
            rate_limit: Some(RateLimiterConfig::default()),
            retry: RetryConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Parse a YAML document
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_yaml_str(&contents)
    }

    /// Override the base URL
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Check field consistency
    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(Error::config("base_url must not be empty"));
        }
        let url = url::Url::parse(&self.base_url)?;
        if url.cannot_be_a_base() {
            return Err(Error::config(format!(
                "base_url {} cannot be used as a base",
                self.base_url
            )));
        }
        if self.cache.enabled && self.cache.capacity == 0 {
            return Err(Error::config("cache.capacity must be at least 1"));
        }
        Ok(())
    }

    /// Transport configuration derived from these settings
    pub fn http_config(&self) -> HttpClientConfig {
        let mut config = HttpClientConfig {
            rate_limit: self.rate_limit.clone(),
            retry: self.retry.policy(),
            cache: None,
            ..HttpClientConfig::default()
        };
        if self.cache.enabled {
            config.cache = Some(Arc::new(MemoryCache::new(self.cache.capacity)));
        }
        if let Some(agent) = &self.user_agent {
            config.user_agent.clone_from(agent);
        }
        config
    }
}

// ============================================================================
// Retry / Cache
// ============================================================================

/// Retry settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Retries after the first attempt
    pub max_retries: u32,

    /// Lower backoff bound in milliseconds (bounds given in reverse are swapped)
    pub wait_min_ms: u64,

    /// Upper backoff bound in milliseconds
    pub wait_max_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 4,
            wait_min_ms: 1000,
            wait_max_ms: 30_000,
        }
    }
}

impl RetryConfig {
    /// Build a retry policy with the default predicate
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_retries,
            Duration::from_millis(self.wait_min_ms),
            Duration::from_millis(self.wait_max_ms),
        )
    }
}

/// Response cache settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Store cacheable responses in memory
    pub enabled: bool,
    /// Maximum number of cached responses
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            capacity: crate::http::DEFAULT_CACHE_CAPACITY,
        }
    }
}
