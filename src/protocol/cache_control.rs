//! `Cache-Control` parsing and formatting.
//!
//! Handles the directive subset the cache policy acts on ([RFC 9111 Section 5.2]).
//! Unrecognized directives are ignored, and directive names are matched
//! case-insensitively.
//!
//! # Directives
//!
//! | Directive | Field | Example |
//! |-----------|-------|---------|
//! | `max-age` | `max_age` | `max-age=86400` |
//! | `max-stale` | `max_stale` | `max-stale=604800` |
//! | `no-cache` | `no_cache` | `no-cache` |
//! | `no-store` | `no_store` | `no-store` |
//! | `public` | `public` | `public` |
//! | `private` | `private` | `private` |
//!
//! [RFC 9111 Section 5.2]: https://www.rfc-editor.org/rfc/rfc9111#section-5.2

use http::HeaderMap;

use super::constants::headers::CACHE_CONTROL;

/// Parsed `Cache-Control` directives.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheDirectives {
    /// `max-age` in seconds.
    pub max_age: Option<u64>,
    /// `Some(None)` is a bare `max-stale` (any staleness accepted).
    pub max_stale: Option<Option<u64>>,
    /// `no-cache`
    pub no_cache: bool,
    /// `no-store`
    pub no_store: bool,
    /// `public`
    pub public: bool,
    /// `private`
    pub private: bool,
}

impl CacheDirectives {
    /// Parse a header value.
    ///
    /// # Examples
    ///
    /// ```
    /// use news_sources::protocol::CacheDirectives;
    ///
    /// let d = CacheDirectives::parse("no-cache, no-store, must-revalidate");
    /// assert!(d.no_cache && d.no_store);
    /// assert_eq!(d.max_age, None);
    ///
    /// let d = CacheDirectives::parse("Max-Age=\"60\", max-stale");
    /// assert_eq!(d.max_age, Some(60));
    /// assert_eq!(d.max_stale, Some(None));
    /// ```
    pub fn parse(value: &str) -> Self {
        let mut directives = CacheDirectives::default();

        for part in value.split(',') {
            let trimmed = part.trim();
            if trimmed.is_empty() {
                continue;
            }
            let (name, argument) = match trimmed.split_once('=') {
                Some((name, argument)) => (name.trim(), Some(unquote(argument.trim()))),
                None => (trimmed, None),
            };

            match name.to_ascii_lowercase().as_str() {
                "max-age" => directives.max_age = argument.and_then(|a| a.parse().ok()),
                "max-stale" => directives.max_stale = Some(argument.and_then(|a| a.parse().ok())),
                "no-cache" => directives.no_cache = true,
                "no-store" => directives.no_store = true,
                "public" => directives.public = true,
                "private" => directives.private = true,
                _ => {}
            }
        }

        directives
    }

    /// Parse every `Cache-Control` header in `headers`; `None` when absent.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let values: Vec<&str> = headers
            .get_all(CACHE_CONTROL)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect();
        if values.is_empty() {
            return None;
        }
        Some(Self::parse(&values.join(", ")))
    }

    /// Directives that demand a network round trip.
    pub fn force_network() -> Self {
        CacheDirectives {
            no_cache: true,
            ..Default::default()
        }
    }

    /// Directives that accept a stored response up to `max_age` seconds old,
    /// and up to `max_stale` seconds past its freshness.
    pub fn stale_tolerant(max_age: u64, max_stale: u64) -> Self {
        CacheDirectives {
            max_age: Some(max_age),
            max_stale: Some(Some(max_stale)),
            ..Default::default()
        }
    }

    /// Whether these response directives forbid reusing the response.
    pub fn forbids_caching(&self) -> bool {
        self.no_cache || self.no_store
    }
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

/// Format directives as a `Cache-Control` value.
///
/// # Examples
///
/// ```
/// use news_sources::protocol::{format_cache_control, CacheDirectives};
///
/// assert_eq!(format_cache_control(&CacheDirectives::force_network()), "no-cache");
/// ```
pub fn format_cache_control(directives: &CacheDirectives) -> String {
    let mut parts = Vec::new();
    if directives.public {
        parts.push("public".to_string());
    }
    if directives.private {
        parts.push("private".to_string());
    }
    if directives.no_cache {
        parts.push("no-cache".to_string());
    }
    if directives.no_store {
        parts.push("no-store".to_string());
    }
    if let Some(max_age) = directives.max_age {
        parts.push(format!("max-age={}", max_age));
    }
    match directives.max_stale {
        Some(Some(seconds)) => parts.push(format!("max-stale={}", seconds)),
        Some(None) => parts.push("max-stale".to_string()),
        None => {}
    }
    parts.join(", ")
}
