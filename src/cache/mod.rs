//! Response cache stores.
//!
//! The cache policy ([`crate::client::CachePolicyLayer`]) decides *whether* a
//! stored response may be used; the stores here only keep bytes. Two
//! implementations ship with the crate:
//!
//! | Store | Backing | Eviction |
//! |-------|---------|----------|
//! | [`MemoryCache`] | `lru::LruCache` behind a mutex | least recently used, by total bytes |
//! | [`DiskCache`] | one JSON file per key | oldest stored first, by total bytes |
//!
//! Concurrency control is the store's own concern; callers share a store
//! through `Arc<dyn ResponseCache>`.

mod disk;
mod memory;

pub use disk::DiskCache;
pub use memory::MemoryCache;

use crate::error::{NewsError, Result};
use crate::protocol::CacheDirectives;
use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderName, HeaderValue, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime};

/// Key-value store for HTTP responses.
#[async_trait]
pub trait ResponseCache: Send + Sync {
    /// Look up a stored response.
    async fn get(&self, key: &str) -> Result<Option<CachedResponse>>;

    /// Store or replace a response.
    async fn put(&self, key: &str, entry: CachedResponse) -> Result<()>;

    /// Drop a stored response, if present.
    async fn remove(&self, key: &str) -> Result<()>;

    /// Drop every stored response.
    async fn clear(&self) -> Result<()>;
}

/// A stored response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedResponse {
    /// Status code.
    pub status: u16,
    /// Header pairs in received order. Names are lowercase.
    pub headers: Vec<(String, String)>,
    /// Body bytes; base64 in the serialized form.
    #[serde(with = "body_base64")]
    pub body: Bytes,
    /// When the response was stored or last revalidated.
    pub stored_at: SystemTime,
}

impl CachedResponse {
    /// Snapshot a response, stamping it with the current time.
    pub fn from_response(response: &Response<Bytes>) -> Self {
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();

        CachedResponse {
            status: response.status().as_u16(),
            headers,
            body: response.body().clone(),
            stored_at: SystemTime::now(),
        }
    }

    /// Rebuild an HTTP response from the stored parts.
    pub fn to_response(&self) -> Result<Response<Bytes>> {
        let status = StatusCode::from_u16(self.status)
            .map_err(|e| NewsError::Cache(format!("stored status {}: {}", self.status, e)))?;
        let mut response = Response::new(self.body.clone());
        *response.status_mut() = status;

        let headers = response.headers_mut();
        for (name, value) in &self.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| NewsError::Cache(format!("stored header name {}: {}", name, e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| NewsError::Cache(format!("stored header value: {}", e)))?;
            headers.append(name, value);
        }

        Ok(response)
    }

    /// First value of a header, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Time elapsed since the entry was stored. Clock skew yields zero.
    pub fn age(&self, now: SystemTime) -> Duration {
        now.duration_since(self.stored_at).unwrap_or(Duration::ZERO)
    }

    /// Freshness lifetime from the stored `Cache-Control: max-age`, zero when absent.
    pub fn freshness_lifetime(&self) -> Duration {
        let seconds = self
            .header("cache-control")
            .map(CacheDirectives::parse)
            .and_then(|d| d.max_age)
            .unwrap_or(0);
        Duration::from_secs(seconds)
    }

    /// Whether the entry carries an `ETag` or `Last-Modified` validator.
    pub fn has_validators(&self) -> bool {
        self.header("etag").is_some() || self.header("last-modified").is_some()
    }

    /// Approximate footprint used for the byte budget.
    pub fn size(&self) -> u64 {
        let headers: usize = self.headers.iter().map(|(n, v)| n.len() + v.len()).sum();
        (self.body.len() + headers) as u64
    }

    /// Same entry with a new stored-at time.
    pub fn restamped(mut self, stored_at: SystemTime) -> Self {
        self.stored_at = stored_at;
        self
    }
}

mod body_base64 {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use bytes::Bytes;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(body: &Bytes, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(body))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Bytes, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map(Bytes::from)
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
pub(crate) fn sample_entry(body: &'static str, cache_control: &str) -> CachedResponse {
    CachedResponse {
        status: 200,
        headers: vec![
            ("content-type".to_string(), "application/json".to_string()),
            ("cache-control".to_string(), cache_control.to_string()),
        ],
        body: Bytes::from_static(body.as_bytes()),
        stored_at: SystemTime::now(),
    }
}
