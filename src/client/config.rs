//! Client configuration.

use crate::client::logging::LogLevel;
use crate::error::{NewsError, Result};
use crate::protocol::constants::{
    CONNECT_TIMEOUT, DEFAULT_BASE_URL, DEFAULT_CACHE_MAX_BYTES, READ_TIMEOUT,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Where responses are cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheConfig {
    /// No response store; the cache policy only rewrites headers.
    Disabled,
    /// In-process LRU store.
    Memory {
        /// Byte budget.
        max_bytes: u64,
    },
    /// Persistent store under `dir`.
    Disk {
        /// Cache directory.
        dir: PathBuf,
        /// Byte budget.
        max_bytes: u64,
    },
}

/// Configuration for [`crate::client::NewsApiClient`].
///
/// # Examples
///
/// ```
/// use news_sources::client::ClientConfig;
/// use std::time::Duration;
///
/// let config = ClientConfig {
///     api_key: "secret".to_string(),
///     enable_logging: true,
///     ..Default::default()
/// };
/// assert_eq!(config.connect_timeout, Duration::from_secs(30));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API base URL; endpoint paths are joined under it.
    pub base_url: String,
    /// Value of the `x-api-key` header.
    pub api_key: String,
    /// Value of the `User-Agent` header.
    pub user_agent: String,
    /// Socket connect timeout, fixed for the whole client.
    pub connect_timeout: Duration,
    /// Socket read timeout, fixed for the whole client.
    pub read_timeout: Duration,
    /// Response store selection.
    pub cache: CacheConfig,
    /// Rewrite origin `no-cache`/`no-store` (or missing) `Cache-Control` so responses can be stored.
    pub override_origin_no_store: bool,
    /// Log full exchanges (with sensitive headers redacted).
    pub enable_logging: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: String::new(),
            user_agent: format!("news-sources/{}", env!("CARGO_PKG_VERSION")),
            connect_timeout: CONNECT_TIMEOUT,
            read_timeout: READ_TIMEOUT,
            cache: CacheConfig::Memory {
                max_bytes: DEFAULT_CACHE_MAX_BYTES,
            },
            override_origin_no_store: true,
            enable_logging: false,
        }
    }
}

impl ClientConfig {
    /// Build a configuration from `NEWS_*` environment variables.
    ///
    /// | Variable | Effect |
    /// |----------|--------|
    /// | `NEWS_API_BASE_URL` | base URL |
    /// | `NEWS_API_KEY` | base64-encoded API key |
    /// | `NEWS_API_USER_AGENT` | user agent |
    /// | `NEWS_CACHE_DIR` | switch to the disk cache rooted here |
    /// | `NEWS_CACHE_MAX_BYTES` | cache budget |
    /// | `NEWS_HTTP_DEBUG` | `1`/`true` enables exchange logging |
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`ClientConfig::from_env`] with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = ClientConfig::default();

        if let Some(base_url) = lookup("NEWS_API_BASE_URL") {
            config.base_url = base_url;
        }
        if let Some(encoded) = lookup("NEWS_API_KEY") {
            config.api_key = decode_api_key(&encoded)?;
        }
        if let Some(user_agent) = lookup("NEWS_API_USER_AGENT") {
            config.user_agent = user_agent;
        }

        let max_bytes = match lookup("NEWS_CACHE_MAX_BYTES") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|e| {
                NewsError::Config(format!("NEWS_CACHE_MAX_BYTES={}: {}", raw, e))
            })?,
            None => DEFAULT_CACHE_MAX_BYTES,
        };
        config.cache = match lookup("NEWS_CACHE_DIR") {
            Some(dir) if !dir.trim().is_empty() => CacheConfig::Disk {
                dir: PathBuf::from(dir),
                max_bytes,
            },
            _ => CacheConfig::Memory { max_bytes },
        };

        if let Some(flag) = lookup("NEWS_HTTP_DEBUG") {
            config.enable_logging = matches!(flag.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes");
        }

        config.validate()?;
        Ok(config)
    }

    /// Check the configuration before building a client.
    pub fn validate(&self) -> Result<()> {
        let url = self.parsed_base_url()?;
        if !url.path().ends_with('/') {
            return Err(NewsError::Config(format!(
                "base URL must end with '/': {}",
                self.base_url
            )));
        }
        if self.connect_timeout.is_zero() || self.read_timeout.is_zero() {
            return Err(NewsError::Config("timeouts must be non-zero".to_string()));
        }
        Ok(())
    }

    /// Base URL parsed.
    pub fn parsed_base_url(&self) -> Result<Url> {
        Url::parse(&self.base_url)
            .map_err(|e| NewsError::Config(format!("invalid base URL {}: {}", self.base_url, e)))
    }

    /// Exchange logging level implied by `enable_logging`.
    pub fn log_level(&self) -> LogLevel {
        if self.enable_logging {
            LogLevel::Body
        } else {
            LogLevel::None
        }
    }
}

fn decode_api_key(encoded: &str) -> Result<String> {
    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|e| NewsError::Config(format!("NEWS_API_KEY is not valid base64: {}", e)))?;
    String::from_utf8(bytes)
        .map_err(|e| NewsError::Config(format!("NEWS_API_KEY is not UTF-8: {}", e)))
}
