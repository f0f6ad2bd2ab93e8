//! Innermost service: executes requests with `reqwest`.
//!
//! Failures that produce no HTTP response are classified into a [`Fault`]
//! here, so the layers above only ever see a [`NewsError::Transport`] for
//! connectivity problems:
//!
//! | Condition | Fault |
//! |-----------|-------|
//! | connect or read timeout | [`Fault::Timeout`] |
//! | host unresolved, connection refused or reset during connect | [`Fault::NoConnectivity`] |
//! | anything else | [`Fault::Unknown`] |

use super::config::ClientConfig;
use super::{HttpRequest, HttpResponse};
use crate::error::{Fault, NewsError, Result};
use crate::protocol::constants::MAX_ERROR_BODY_BYTES;
use bytes::{Bytes, BytesMut};
use futures::future::BoxFuture;
use futures::StreamExt;
use http::StatusCode;
use std::error::Error as StdError;
use std::io;
use std::task::{Context, Poll};
use tower::Service;

/// Service executing requests over a shared `reqwest::Client`.
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Build the transport with the configured timeouts.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .read_timeout(config.read_timeout)
            .build()
            .map_err(|e| NewsError::Config(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self::from_client(client))
    }

    /// Wrap an existing client.
    pub fn from_client(client: reqwest::Client) -> Self {
        ReqwestTransport { client }
    }
}

impl Service<HttpRequest> for ReqwestTransport {
    type Response = HttpResponse;
    type Error = NewsError;
    type Future = BoxFuture<'static, Result<HttpResponse>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: HttpRequest) -> Self::Future {
        let client = self.client.clone();
        Box::pin(async move {
            let request = reqwest::Request::try_from(request)
                .map_err(|e| NewsError::InvalidRequest(e.to_string()))?;
            let response = client
                .execute(request)
                .await
                .map_err(classify_transport_error)?;
            read_response(response).await
        })
    }
}

async fn read_response(response: reqwest::Response) -> Result<HttpResponse> {
    let status = response.status();
    let version = response.version();
    let headers = response.headers().clone();

    // Failure bodies only feed diagnostics.
    let limit = if status.is_success() || status == StatusCode::NOT_MODIFIED {
        None
    } else {
        Some(MAX_ERROR_BODY_BYTES)
    };
    let body = read_body(response, limit).await?;

    let mut out = http::Response::new(body);
    *out.status_mut() = status;
    *out.version_mut() = version;
    *out.headers_mut() = headers;
    Ok(out)
}

async fn read_body(response: reqwest::Response, limit: Option<usize>) -> Result<Bytes> {
    let mut stream = response.bytes_stream();
    let mut buf = BytesMut::new();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(classify_transport_error)?;
        match limit {
            Some(limit) if buf.len() + chunk.len() >= limit => {
                buf.extend_from_slice(&chunk[..limit - buf.len()]);
                break;
            }
            _ => buf.extend_from_slice(&chunk),
        }
    }

    Ok(buf.freeze())
}

/// Classify a `reqwest` failure. Timeouts win over connect errors.
pub fn classify_transport_error(error: reqwest::Error) -> Fault {
    if error.is_timeout() {
        return Fault::timeout(error);
    }
    if error.is_connect() {
        return Fault::no_connectivity(error);
    }

    let io_kind = source_chain(&error)
        .find_map(|cause| cause.downcast_ref::<io::Error>())
        .map(io::Error::kind);
    match io_kind {
        Some(kind) if is_timeout_kind(kind) => Fault::timeout(error),
        Some(kind) if is_connectivity_kind(kind) => Fault::no_connectivity(error),
        _ => Fault::unknown(error),
    }
}

fn is_timeout_kind(kind: io::ErrorKind) -> bool {
    kind == io::ErrorKind::TimedOut
}

fn is_connectivity_kind(kind: io::ErrorKind) -> bool {
    matches!(
        kind,
        io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::NotConnected
            | io::ErrorKind::AddrNotAvailable
    )
}

fn source_chain<'a>(
    error: &'a (dyn StdError + 'static),
) -> impl Iterator<Item = &'a (dyn StdError + 'static)> {
    std::iter::successors(Some(error), |&e| e.source())
}
