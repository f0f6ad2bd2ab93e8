//! Cache policy middleware.
//!
//! Sits directly above the transport and owns both directions of the
//! caching contract for `GET` requests:
//!
//! # Request side
//!
//! | Condition | Effect |
//! |-----------|--------|
//! | `x-force-refresh: true` | `Cache-Control: no-cache`; the store is never served, but its validators are sent |
//! | otherwise | `Cache-Control: max-age=86400, max-stale=604800` |
//! | always | the force-refresh marker and `Pragma` are stripped before the request leaves |
//!
//! # Response side
//!
//! `Pragma` is stripped. With `override_origin_no_store` enabled, a missing
//! `Cache-Control`, or one containing `no-cache`/`no-store`, is replaced by
//! `public, max-age=86400`. `200` responses that end up storable are written
//! to the store.
//!
//! # Store interaction
//!
//! - a fresh entry is answered locally with `Age` and `x-cache: HIT`
//! - a stale entry with validators is revalidated; `304` restamps it and
//!   answers with the stored body as `200`
//! - on a transport fault, a stale entry within `max-stale` is answered with
//!   `Warning: 110 - "Response is Stale"`
//! - a forced `304` is returned as-is, so callers can report "no change"
//!
//! Store failures are logged and treated as misses.

use super::{HttpRequest, HttpResponse};
use crate::cache::{CachedResponse, ResponseCache};
use crate::error::{NewsError, Result};
use crate::protocol::constants::headers::{
    AGE, CACHE_CONTROL, ETAG, IF_MODIFIED_SINCE, IF_NONE_MATCH, LAST_MODIFIED, PRAGMA, WARNING,
    X_CACHE, X_FORCE_REFRESH,
};
use crate::protocol::constants::{
    override_cache_control, FORCE_REFRESH_VALUE, MAX_AGE_SECONDS, MAX_STALE_SECONDS, STALE_WARNING,
};
use crate::protocol::{format_cache_control, CacheDirectives};
use futures::future::BoxFuture;
use http::{HeaderValue, Method, StatusCode};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::{Duration, SystemTime};
use tower::{Layer, Service};

/// Layer producing [`CachePolicy`].
#[derive(Clone)]
pub struct CachePolicyLayer {
    store: Option<Arc<dyn ResponseCache>>,
    override_origin_no_store: bool,
}

impl CachePolicyLayer {
    /// Policy backed by `store`.
    pub fn new(store: Arc<dyn ResponseCache>) -> Self {
        CachePolicyLayer {
            store: Some(store),
            override_origin_no_store: true,
        }
    }

    /// Policy that only rewrites headers.
    pub fn without_store() -> Self {
        CachePolicyLayer {
            store: None,
            override_origin_no_store: true,
        }
    }

    /// Toggle the origin `Cache-Control` rewrite.
    pub fn override_origin_no_store(mut self, enabled: bool) -> Self {
        self.override_origin_no_store = enabled;
        self
    }
}

impl<S> Layer<S> for CachePolicyLayer {
    type Service = CachePolicy<S>;

    fn layer(&self, inner: S) -> Self::Service {
        CachePolicy {
            inner,
            store: self.store.clone(),
            override_origin_no_store: self.override_origin_no_store,
        }
    }
}

/// Service applying the cache policy.
#[derive(Clone)]
pub struct CachePolicy<S> {
    inner: S,
    store: Option<Arc<dyn ResponseCache>>,
    override_origin_no_store: bool,
}

impl<S> Service<HttpRequest> for CachePolicy<S>
where
    S: Service<HttpRequest, Response = HttpResponse, Error = NewsError> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = HttpResponse;
    type Error = NewsError;
    type Future = BoxFuture<'static, Result<HttpResponse>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<()>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: HttpRequest) -> Self::Future {
        // Keep the clone that was driven to readiness.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let store = self.store.clone();
        let override_origin = self.override_origin_no_store;

        Box::pin(async move {
            if request.method() != Method::GET {
                return inner.call(request).await;
            }

            let (request, force_refresh) = prepare_request(request)?;
            match store {
                Some(store) => {
                    let exchange = Exchange {
                        store,
                        force_refresh,
                        override_origin,
                    };
                    exchange.run(inner, request).await
                }
                None => {
                    let response = inner.call(request).await?;
                    Ok(rewrite_response(response, override_origin))
                }
            }
        })
    }
}

/// Apply the request half of the policy. Returns whether the request forced a refresh.
///
/// A forced refresh never answers from the store, but the exchange still
/// attaches `If-None-Match`/`If-Modified-Since` from a stored entry. That
/// lets the origin reply `304` when nothing changed, which the data layer
/// reports as no change instead of re-downloading the listing.
///
/// # Examples
///
/// ```
/// use bytes::Bytes;
/// use news_sources::client::prepare_request;
///
/// let request = http::Request::get("https://newsapi.org/v2/top-headlines/sources")
///     .header("x-force-refresh", "true")
///     .body(Bytes::new())
///     .unwrap();
/// let (request, forced) = prepare_request(request).unwrap();
/// assert!(forced);
/// assert_eq!(request.headers()["cache-control"], "no-cache");
/// assert!(request.headers().get("x-force-refresh").is_none());
/// ```
pub fn prepare_request(mut request: HttpRequest) -> Result<(HttpRequest, bool)> {
    let headers = request.headers_mut();
    let force_refresh = headers
        .get(X_FORCE_REFRESH)
        .and_then(|v| v.to_str().ok())
        .map_or(false, |v| v.trim() == FORCE_REFRESH_VALUE);
    headers.remove(X_FORCE_REFRESH);
    headers.remove(PRAGMA);

    let directives = if force_refresh {
        CacheDirectives::force_network()
    } else {
        CacheDirectives::stale_tolerant(MAX_AGE_SECONDS, MAX_STALE_SECONDS)
    };
    let value = HeaderValue::from_str(&format_cache_control(&directives))
        .map_err(|e| NewsError::InvalidRequest(e.to_string()))?;
    headers.insert(CACHE_CONTROL, value);

    Ok((request, force_refresh))
}

/// Apply the response half of the policy.
pub fn rewrite_response(mut response: HttpResponse, override_origin_no_store: bool) -> HttpResponse {
    let headers = response.headers_mut();
    headers.remove(PRAGMA);

    if override_origin_no_store {
        let forbids = CacheDirectives::from_headers(headers).map_or(true, |d| d.forbids_caching());
        if forbids {
            if let Ok(value) = HeaderValue::from_str(&override_cache_control()) {
                headers.insert(CACHE_CONTROL, value);
            }
        }
    }

    response
}

fn is_storable(response: &HttpResponse) -> bool {
    response.status() == StatusCode::OK
        && CacheDirectives::from_headers(response.headers()).map_or(false, |d| !d.forbids_caching())
}

fn cache_key(request: &HttpRequest) -> String {
    format!("{} {}", request.method(), request.uri())
}

struct Exchange {
    store: Arc<dyn ResponseCache>,
    force_refresh: bool,
    override_origin: bool,
}

impl Exchange {
    async fn run<S>(self, mut inner: S, mut request: HttpRequest) -> Result<HttpResponse>
    where
        S: Service<HttpRequest, Response = HttpResponse, Error = NewsError>,
    {
        let key = cache_key(&request);
        let requested = CacheDirectives::from_headers(request.headers()).unwrap_or_default();
        let stored = self.lookup(&key).await;
        let now = SystemTime::now();

        if let Some(entry) = &stored {
            if !requested.no_cache {
                let age = entry.age(now);
                let lifetime = match requested.max_age {
                    Some(max_age) => Duration::from_secs(max_age).min(entry.freshness_lifetime()),
                    None => entry.freshness_lifetime(),
                };
                if age < lifetime {
                    tracing::debug!(%key, age_secs = age.as_secs(), "cache hit");
                    return serve_stored(entry, age, None);
                }
            }
            if entry.has_validators() {
                add_validators(&mut request, entry);
            }
        }

        match inner.call(request).await {
            Ok(response) => {
                let response = rewrite_response(response, self.override_origin);
                if response.status() == StatusCode::NOT_MODIFIED {
                    return self.not_modified(&key, stored, response).await;
                }
                if is_storable(&response) {
                    self.save(&key, CachedResponse::from_response(&response)).await;
                }
                Ok(response)
            }
            Err(NewsError::Transport(fault)) if !self.force_refresh => {
                let usable = stored.filter(|entry| within_stale_window(entry, now, &requested));
                match usable {
                    Some(entry) => {
                        tracing::warn!(%key, error = %fault, "network unavailable, serving stale response");
                        serve_stored(&entry, entry.age(now), Some(STALE_WARNING))
                    }
                    None => Err(fault.into()),
                }
            }
            Err(error) => Err(error),
        }
    }

    async fn not_modified(
        &self,
        key: &str,
        stored: Option<CachedResponse>,
        response: HttpResponse,
    ) -> Result<HttpResponse> {
        let Some(entry) = stored else {
            return Ok(response);
        };

        let refreshed = merge_headers(entry, &response).restamped(SystemTime::now());
        self.save(key, refreshed.clone()).await;

        if self.force_refresh {
            tracing::debug!(%key, "forced revalidation: not modified");
            Ok(response)
        } else {
            tracing::debug!(%key, "revalidated stored response");
            serve_stored(&refreshed, Duration::ZERO, None)
        }
    }

    async fn lookup(&self, key: &str) -> Option<CachedResponse> {
        match self.store.get(key).await {
            Ok(entry) => entry,
            Err(error) => {
                tracing::warn!(%key, %error, "cache read failed, treating as miss");
                None
            }
        }
    }

    async fn save(&self, key: &str, entry: CachedResponse) {
        if let Err(error) = self.store.put(key, entry).await {
            tracing::warn!(%key, %error, "cache write failed");
        }
    }
}

fn add_validators(request: &mut HttpRequest, entry: &CachedResponse) {
    let headers = request.headers_mut();
    if let Some(etag) = entry.header(ETAG.as_str()).and_then(|v| HeaderValue::from_str(v).ok()) {
        headers.insert(IF_NONE_MATCH, etag);
    }
    if let Some(modified) = entry
        .header(LAST_MODIFIED.as_str())
        .and_then(|v| HeaderValue::from_str(v).ok())
    {
        headers.insert(IF_MODIFIED_SINCE, modified);
    }
}

fn within_stale_window(entry: &CachedResponse, now: SystemTime, requested: &CacheDirectives) -> bool {
    let staleness = entry.age(now).saturating_sub(entry.freshness_lifetime());
    match requested.max_stale {
        Some(Some(max_stale)) => staleness <= Duration::from_secs(max_stale),
        Some(None) => true,
        None => false,
    }
}

/// Headers of a `304` replace the stored ones of the same name.
fn merge_headers(mut entry: CachedResponse, response: &HttpResponse) -> CachedResponse {
    for (name, value) in response.headers() {
        if *name == http::header::CONTENT_LENGTH {
            continue;
        }
        let Ok(value) = value.to_str() else { continue };
        entry.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(name.as_str()));
        entry.headers.push((name.as_str().to_string(), value.to_string()));
    }
    entry
}

fn serve_stored(
    entry: &CachedResponse,
    age: Duration,
    warning: Option<&'static str>,
) -> Result<HttpResponse> {
    let mut response = entry.to_response()?;
    let headers = response.headers_mut();
    headers.insert(AGE, HeaderValue::from(age.as_secs()));
    match warning {
        Some(warning) => {
            headers.insert(WARNING, HeaderValue::from_static(warning));
            headers.insert(X_CACHE, HeaderValue::from_static("STALE"));
        }
        None => {
            headers.insert(X_CACHE, HeaderValue::from_static("HIT"));
        }
    }
    Ok(response)
}
