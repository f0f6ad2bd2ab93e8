//! Protocol constants.

use std::time::Duration;

/// Header names used by the client stack.
pub mod headers {
    use http::HeaderName;

    /// One-shot marker asking the cache policy for a live round trip.
    pub const X_FORCE_REFRESH: HeaderName = HeaderName::from_static("x-force-refresh");
    /// API key header.
    pub const X_API_KEY: HeaderName = HeaderName::from_static("x-api-key");
    /// Set on responses served from the local cache.
    pub const X_CACHE: HeaderName = HeaderName::from_static("x-cache");

    pub use http::header::{
        AGE, CACHE_CONTROL, ETAG, IF_MODIFIED_SINCE, IF_NONE_MATCH, LAST_MODIFIED, PRAGMA,
        USER_AGENT, WARNING,
    };
}

/// Endpoint paths relative to the base URL.
pub mod endpoints {
    /// News sources listing.
    pub const SOURCES: &str = "top-headlines/sources";
}

/// Default API base URL. Must end with `/` so endpoint paths join under it.
pub const DEFAULT_BASE_URL: &str = "https://newsapi.org/v2/";

/// How long a stored response is served as fresh (1 day).
pub const MAX_AGE_SECONDS: u64 = 86_400;

/// How long past its freshness a stored response may be served when the
/// network is unreachable (7 days).
pub const MAX_STALE_SECONDS: u64 = 604_800;

/// Upper bound on the error body read by the status classifier (64 KiB).
pub const MAX_ERROR_BODY_BYTES: usize = 64 * 1024;

/// Default cache budget (10 MiB).
pub const DEFAULT_CACHE_MAX_BYTES: u64 = 10 * 1024 * 1024;

/// Connect timeout applied once for the whole client.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Read timeout applied once for the whole client.
pub const READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Value of the force-refresh marker when forcing. The marker is never sent as `false`.
pub const FORCE_REFRESH_VALUE: &str = "true";

/// `Cache-Control` the response rewrite installs when the origin forbids caching.
pub fn override_cache_control() -> String {
    format!("public, max-age={}", MAX_AGE_SECONDS)
}

/// `Warning` value attached to stale responses served after a transport fault.
pub const STALE_WARNING: &str = "110 - \"Response is Stale\"";
