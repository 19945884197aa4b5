//! Client configuration
//!
//! [`ClientConfig`] describes one upstream API: where it lives, how to
//! authenticate, how fast it may be called and how failures are retried. It is
//! usually loaded from YAML:
//!
//! ```yaml
//! base_url: https://pro-api.example.com/v2.0
//! auth_token_env: EXAMPLE_TOKEN
//! tier: pro
//! paging_retry:
//!   max_attempts: 10
//!   interval_ms: 500
//! paging:
//!   max_concurrency: 4
//! ```

use crate::error::{Error, Result, ResultExt};
use crate::http::{HttpClientConfig, RateGateConfig, RateTier, RetryPolicy};
use crate::types::HeaderSet;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Environment variable read when no token is configured
pub const DEFAULT_AUTH_TOKEN_ENV: &str = "FANOUT_AUTH_TOKEN";

// ============================================================================
// Top-Level Client Config
// ============================================================================

/// Complete client configuration loaded from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL for API requests
    pub base_url: String,

    /// API token; falls back to the `auth_token_env` variable when absent
    #[serde(default)]
    pub auth_token: Option<String>,

    /// Environment variable holding the token
    #[serde(default = "default_auth_token_env")]
    pub auth_token_env: String,

    /// Header that carries the token
    #[serde(default = "default_auth_header")]
    pub auth_header: String,

    /// Extra static headers
    #[serde(default)]
    pub headers: HeaderSet,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// User agent override
    #[serde(default)]
    pub user_agent: Option<String>,

    /// Explicit rate budget; takes precedence over `tier`
    #[serde(default)]
    pub rate_limit: Option<RateGateConfig>,

    /// Named rate budget
    #[serde(default)]
    pub tier: RateTier,

    /// Retry policy for single calls
    #[serde(default)]
    pub retry: RetryPolicy,

    /// Retry policy for each page of a paged call
    #[serde(default = "RetryPolicy::paging")]
    pub paging_retry: RetryPolicy,

    /// Paging defaults
    #[serde(default)]
    pub paging: PagingDefaults,
}

fn default_auth_token_env() -> String {
    DEFAULT_AUTH_TOKEN_ENV.to_string()
}

fn default_auth_header() -> String {
    "token".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

/// Defaults applied to paged calls that do not override them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagingDefaults {
    /// Requests per wave
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// First page index
    #[serde(default = "default_start_page")]
    pub start_page: u64,
}

fn default_max_concurrency() -> usize {
    1
}

fn default_start_page() -> u64 {
    1
}

impl Default for PagingDefaults {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
            start_page: default_start_page(),
        }
    }
}

impl ClientConfig {
    /// Config for `base_url` with every other field at its default
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            auth_token: None,
            auth_token_env: default_auth_token_env(),
            auth_header: default_auth_header(),
            headers: HeaderSet::new(),
            timeout_secs: default_timeout_secs(),
            user_agent: None,
            rate_limit: None,
            tier: RateTier::default(),
            retry: RetryPolicy::default(),
            paging_retry: RetryPolicy::paging(),
            paging: PagingDefaults::default(),
        }
    }

    /// Create a new config builder
    pub fn builder(base_url: impl Into<String>) -> ClientConfigBuilder {
        ClientConfigBuilder {
            config: Self::new(base_url),
        }
    }

    /// Parse and validate a YAML document
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_yaml_str(&yaml)
    }

    /// Check the values serde cannot
    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(Error::config("base_url must not be empty"));
        }
        url::Url::parse(&self.base_url)
            .map_err(|e| Error::config(format!("invalid base_url '{}': {}", self.base_url, e)))?;

        let budget = self.rate_gate_config();
        if budget.capacity == 0 || budget.window_ms == 0 {
            return Err(Error::config(
                "rate_limit capacity and window_ms must be greater than zero",
            ));
        }
        Ok(())
    }

    /// Configured token, else the token in the `auth_token_env` variable
    pub fn resolved_token(&self) -> Option<String> {
        self.auth_token
            .clone()
            .filter(|token| !token.is_empty())
            .or_else(|| std::env::var(&self.auth_token_env).ok())
            .filter(|token| !token.is_empty())
    }

    /// Rate budget in effect
    pub fn rate_gate_config(&self) -> RateGateConfig {
        self.rate_limit.unwrap_or_else(|| self.tier.config())
    }

    /// Transport settings
    pub fn http_config(&self) -> HttpClientConfig {
        let builder = HttpClientConfig::builder().timeout(Duration::from_secs(self.timeout_secs));
        match &self.user_agent {
            Some(agent) => builder.user_agent(agent.clone()).build(),
            None => builder.build(),
        }
    }

    /// Headers sent with every request: JSON content type, the auth token
    /// when one resolves, then the configured extras
    pub fn static_headers(&self) -> HeaderSet {
        let mut headers = HeaderSet::new();
        headers.insert("content-type", "application/json");
        if let Some(token) = self.resolved_token() {
            headers.insert(self.auth_header.clone(), token);
        }
        headers.merge(&self.headers);
        headers
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for client config
#[derive(Debug, Clone)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Set the API token
    pub fn auth_token(mut self, token: impl Into<String>) -> Self {
        self.config.auth_token = Some(token.into());
        self
    }

    /// Set the header that carries the token
    pub fn auth_header(mut self, header: impl Into<String>) -> Self {
        self.config.auth_header = header.into();
        self
    }

    /// Add a static header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.headers.insert(key.into(), value.into());
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout_secs = timeout.as_secs();
        self
    }

    /// Use a named rate budget
    pub fn tier(mut self, tier: RateTier) -> Self {
        self.config.tier = tier;
        self
    }

    /// Use an explicit rate budget
    pub fn rate_limit(mut self, budget: RateGateConfig) -> Self {
        self.config.rate_limit = Some(budget);
        self
    }

    /// Set the retry policy for single calls
    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.config.retry = retry;
        self
    }

    /// Set the retry policy for paged calls
    pub fn paging_retry(mut self, retry: RetryPolicy) -> Self {
        self.config.paging_retry = retry;
        self
    }

    /// Set the default wave size
    pub fn max_concurrency(mut self, concurrency: usize) -> Self {
        self.config.paging.max_concurrency = concurrency;
        self
    }

    /// Build the config
    pub fn build(self) -> ClientConfig {
        self.config
    }
}
