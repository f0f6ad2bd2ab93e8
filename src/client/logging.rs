//! Exchange logging with header redaction.
//!
//! Emits `tracing` events at `debug` for each request and response. The
//! amount of detail is set by [`LogLevel`]; values of the API key and user
//! agent headers are replaced with `██`.

use super::{HttpRequest, HttpResponse};
use crate::error::{NewsError, Result};
use crate::protocol::constants::headers::{USER_AGENT, X_API_KEY};
use bytes::Bytes;
use futures::future::BoxFuture;
use http::{HeaderMap, HeaderName};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;
use tower::{Layer, Service};

/// Longest body prefix written at [`LogLevel::Body`].
const MAX_LOGGED_BODY_BYTES: usize = 4 * 1024;

const REDACTED: &str = "██";

/// How much of each exchange is logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    /// Nothing.
    None,
    /// Request line, status and timing.
    Basic,
    /// `Basic` plus headers.
    Headers,
    /// `Headers` plus bodies.
    Body,
}

/// Layer producing [`HttpLogging`].
#[derive(Clone, Debug)]
pub struct HttpLoggingLayer {
    level: LogLevel,
    redacted: Arc<[HeaderName]>,
}

impl HttpLoggingLayer {
    /// Layer logging at `level`, redacting the API key and user agent.
    pub fn new(level: LogLevel) -> Self {
        HttpLoggingLayer {
            level,
            redacted: Arc::from(vec![X_API_KEY, USER_AGENT]),
        }
    }
}

impl<S> Layer<S> for HttpLoggingLayer {
    type Service = HttpLogging<S>;

    fn layer(&self, inner: S) -> Self::Service {
        HttpLogging {
            inner,
            level: self.level,
            redacted: Arc::clone(&self.redacted),
        }
    }
}

/// Service logging each exchange.
#[derive(Clone, Debug)]
pub struct HttpLogging<S> {
    inner: S,
    level: LogLevel,
    redacted: Arc<[HeaderName]>,
}

impl<S> Service<HttpRequest> for HttpLogging<S>
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
        let level = self.level;
        if level == LogLevel::None {
            return Box::pin(self.inner.call(request));
        }

        let method = request.method().clone();
        let uri = request.uri().clone();
        tracing::debug!(%method, %uri, "--> request");
        if level >= LogLevel::Headers {
            tracing::debug!(headers = %render_headers(request.headers(), &self.redacted), "--> headers");
        }
        if level >= LogLevel::Body && !request.body().is_empty() {
            tracing::debug!(body = %render_body(request.body()), "--> body");
        }

        let redacted = Arc::clone(&self.redacted);
        let started = Instant::now();
        let response = self.inner.call(request);

        Box::pin(async move {
            let result = response.await;
            let elapsed_ms = started.elapsed().as_millis() as u64;
            match &result {
                Ok(response) => {
                    tracing::debug!(status = response.status().as_u16(), %uri, elapsed_ms, "<-- response");
                    if level >= LogLevel::Headers {
                        tracing::debug!(headers = %render_headers(response.headers(), &redacted), "<-- headers");
                    }
                    if level >= LogLevel::Body && !response.body().is_empty() {
                        tracing::debug!(body = %render_body(response.body()), "<-- body");
                    }
                }
                Err(error) => {
                    tracing::debug!(%method, %uri, elapsed_ms, %error, "<-- HTTP FAILED");
                }
            }
            result
        })
    }
}

/// Render headers as `name: value` lines, masking redacted values.
pub fn render_headers(headers: &HeaderMap, redacted: &[HeaderName]) -> String {
    headers
        .iter()
        .map(|(name, value)| {
            let shown = if redacted.contains(name) {
                REDACTED.to_string()
            } else {
                String::from_utf8_lossy(value.as_bytes()).into_owned()
            };
            format!("{}: {}", name, shown)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_body(body: &Bytes) -> String {
    let shown = &body[..body.len().min(MAX_LOGGED_BODY_BYTES)];
    let mut text = String::from_utf8_lossy(shown).into_owned();
    if body.len() > MAX_LOGGED_BODY_BYTES {
        text.push_str(&format!(" ... ({} bytes total)", body.len()));
    }
    text
}
