//! HTTP status classification.
//!
//! [`HttpStatusLayer`] turns every completed exchange whose status is not
//! `2xx` (or `304`, which the data layer reports as "no change") into a
//! [`HttpFault`]. Transport faults from below pass through untouched.
//!
//! The fault message is resolved in order:
//!
//! 1. `error`, then `message`, from a JSON body shaped like `{"error": .., "message": ..}`
//! 2. the canonical reason phrase of the status
//! 3. `Unknown error <code>`

use super::{HttpRequest, HttpResponse};
use crate::error::{FaultDetails, HttpFault, NewsError, Result};
use crate::protocol::constants::MAX_ERROR_BODY_BYTES;
use crate::protocol::ErrorEnvelope;
use futures::future::BoxFuture;
use http::StatusCode;
use std::task::{Context, Poll};
use tower::{Layer, Service};

/// Layer producing [`HttpStatus`].
#[derive(Clone, Copy, Debug, Default)]
pub struct HttpStatusLayer;

impl HttpStatusLayer {
    /// New classifier layer.
    pub fn new() -> Self {
        HttpStatusLayer
    }
}

impl<S> Layer<S> for HttpStatusLayer {
    type Service = HttpStatus<S>;

    fn layer(&self, inner: S) -> Self::Service {
        HttpStatus { inner }
    }
}

/// Service classifying failure statuses.
#[derive(Clone, Debug)]
pub struct HttpStatus<S> {
    inner: S,
}

impl<S> Service<HttpRequest> for HttpStatus<S>
where
    S: Service<HttpRequest, Response = HttpResponse, Error = NewsError>,
    S::Future: Send + 'static,
{
    type Response = HttpResponse;
    type Error = NewsError;
    type Future = BoxFuture<'static, Result<HttpResponse>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<()>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: HttpRequest) -> Self::Future {
        let method = request.method().to_string();
        let url = request.uri().to_string();
        let response = self.inner.call(request);
        Box::pin(async move { classify_response(response.await?, &method, &url) })
    }
}

/// Pass successful responses through; convert failures to [`HttpFault`].
///
/// # Examples
///
/// ```
/// use bytes::Bytes;
/// use news_sources::client::classify_response;
/// use news_sources::error::{HttpFault, NewsError};
///
/// let response = http::Response::builder()
///     .status(401)
///     .body(Bytes::from_static(br#"{"status":"error","message":"Your API key is invalid."}"#))
///     .unwrap();
///
/// match classify_response(response, "GET", "https://newsapi.org/v2/top-headlines/sources") {
///     Err(NewsError::Http(HttpFault::Unauthorized(details))) => {
///         assert_eq!(details.message, "Your API key is invalid.");
///     }
///     other => panic!("unexpected: {:?}", other),
/// }
/// ```
pub fn classify_response(response: HttpResponse, method: &str, url: &str) -> Result<HttpResponse> {
    let status = response.status();
    if status.is_success() || status == StatusCode::NOT_MODIFIED {
        return Ok(response);
    }

    let raw = response.body();
    let bounded = &raw[..raw.len().min(MAX_ERROR_BODY_BYTES)];
    let body = String::from_utf8_lossy(bounded).into_owned();
    let message = resolve_message(status, &body);

    tracing::debug!(status = status.as_u16(), %method, %url, %message, "request failed");

    Err(HttpFault::from_status(
        status.as_u16(),
        FaultDetails {
            message,
            body,
            method: method.to_string(),
            url: url.to_string(),
        },
    )
    .into())
}

fn resolve_message(status: StatusCode, body: &str) -> String {
    ErrorEnvelope::parse(body)
        .and_then(|envelope| envelope.resolved_message().map(str::to_string))
        .or_else(|| {
            status
                .canonical_reason()
                .filter(|reason| !reason.trim().is_empty())
                .map(str::to_string)
        })
        .unwrap_or_else(|| format!("Unknown error {}", status.as_u16()))
}
