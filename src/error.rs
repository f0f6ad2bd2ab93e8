//! Error types for the news-sources client.
//!
//! Failures are split by where they happen:
//!
//! | Type | Raised when |
//! |------|-------------|
//! | [`Fault`] | The transport call itself failed (DNS, connect, socket, timeout); no HTTP response exists |
//! | [`HttpFault`] | A completed HTTP exchange returned a failure status |
//! | [`NewsError`] | Crate-wide error wrapping the two above plus decode, config, cache and cancellation |
//!
//! The safe call adapter ([`crate::data::safe_api_call`]) is the only place
//! these are recovered; everything below it propagates them with `?`.

use std::fmt;
use thiserror::Error;

/// Boxed error used as the optional cause of a [`Fault`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, NewsError>;

/// A transport-level failure: the request never produced an HTTP response.
#[derive(Debug, Error)]
pub enum Fault {
    /// Host could not be resolved or the connection was refused.
    #[error("no network connectivity")]
    NoConnectivity(#[source] Option<BoxError>),

    /// Connect or read timed out.
    #[error("request timed out")]
    Timeout(#[source] Option<BoxError>),

    /// Any other I/O failure during the call.
    #[error("transport failure")]
    Unknown(#[source] Option<BoxError>),
}

impl Fault {
    /// No-connectivity fault wrapping `cause`.
    pub fn no_connectivity(cause: impl Into<BoxError>) -> Self {
        Fault::NoConnectivity(Some(cause.into()))
    }

    /// Timeout fault wrapping `cause`.
    pub fn timeout(cause: impl Into<BoxError>) -> Self {
        Fault::Timeout(Some(cause.into()))
    }

    /// Unclassified transport fault wrapping `cause`.
    pub fn unknown(cause: impl Into<BoxError>) -> Self {
        Fault::Unknown(Some(cause.into()))
    }

    /// Human-readable description including the underlying cause, if any.
    pub fn describe(&self) -> String {
        let cause = match self {
            Fault::NoConnectivity(cause) | Fault::Timeout(cause) | Fault::Unknown(cause) => cause,
        };
        match cause {
            Some(cause) => format!("{}: {}", self, cause),
            None => self.to_string(),
        }
    }
}

/// Context captured from a failed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FaultDetails {
    /// Message parsed from the error body, or the reason phrase, or a synthesized fallback.
    pub message: String,
    /// Raw error body, at most [`crate::protocol::constants::MAX_ERROR_BODY_BYTES`] long.
    pub body: String,
    /// Method of the originating request.
    pub method: String,
    /// URL of the originating request.
    pub url: String,
}

impl FaultDetails {
    /// Details with only a message set.
    pub fn with_message(message: impl Into<String>) -> Self {
        FaultDetails {
            message: message.into(),
            ..Default::default()
        }
    }
}

/// A completed HTTP exchange whose status is a failure.
///
/// The status code is always consistent with the variant: `ServerError`
/// codes are in `500..=599`, and `Unknown` is used for everything that is
/// not 401, 403, 404 or 5xx.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HttpFault {
    /// 401
    Unauthorized(FaultDetails),
    /// 403
    Forbidden(FaultDetails),
    /// 404
    NotFound(FaultDetails),
    /// 500-599
    ServerError {
        /// The real 5xx status.
        code: u16,
        /// Exchange context.
        details: FaultDetails,
    },
    /// Any other non-success status.
    Unknown {
        /// The status that was received.
        code: u16,
        /// Exchange context.
        details: FaultDetails,
    },
}

impl HttpFault {
    /// Dispatch a failure status to its variant.
    ///
    /// # Examples
    ///
    /// ```
    /// use news_sources::error::{FaultDetails, HttpFault};
    ///
    /// let fault = HttpFault::from_status(503, FaultDetails::with_message("down"));
    /// assert!(matches!(fault, HttpFault::ServerError { code: 503, .. }));
    /// assert_eq!(fault.code(), 503);
    /// ```
    pub fn from_status(code: u16, details: FaultDetails) -> Self {
        match code {
            401 => HttpFault::Unauthorized(details),
            403 => HttpFault::Forbidden(details),
            404 => HttpFault::NotFound(details),
            500..=599 => HttpFault::ServerError { code, details },
            _ => HttpFault::Unknown { code, details },
        }
    }

    /// Numeric status code of the exchange.
    pub fn code(&self) -> u16 {
        match self {
            HttpFault::Unauthorized(_) => 401,
            HttpFault::Forbidden(_) => 403,
            HttpFault::NotFound(_) => 404,
            HttpFault::ServerError { code, .. } | HttpFault::Unknown { code, .. } => *code,
        }
    }

    /// Exchange context carried by every variant.
    pub fn details(&self) -> &FaultDetails {
        match self {
            HttpFault::Unauthorized(details)
            | HttpFault::Forbidden(details)
            | HttpFault::NotFound(details)
            | HttpFault::ServerError { details, .. }
            | HttpFault::Unknown { details, .. } => details,
        }
    }

    /// Resolved error message.
    pub fn message(&self) -> &str {
        &self.details().message
    }
}

impl fmt::Display for HttpFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let details = self.details();
        write!(f, "HTTP Exception {}", self.code())?;
        if !details.message.is_empty() {
            writeln!(f, " -- {}", details.message)?;
        }
        if !details.method.is_empty() && !details.url.is_empty() {
            writeln!(f, "[{} -- {}]", details.method, details.url)?;
        }
        write!(f, "{}", details.body)
    }
}

impl std::error::Error for HttpFault {}

/// Crate-wide error.
#[derive(Debug, Error)]
pub enum NewsError {
    /// Transport-level failure.
    #[error(transparent)]
    Transport(#[from] Fault),

    /// Failure status from a completed exchange.
    #[error(transparent)]
    Http(#[from] HttpFault),

    /// A success body could not be decoded.
    #[error("failed to decode response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// The request could not be built.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Invalid client configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// The response cache store failed.
    #[error("cache error: {0}")]
    Cache(String),

    /// The owning scope was cancelled while the call was in flight.
    #[error("operation cancelled")]
    Cancelled,
}

impl NewsError {
    /// Whether the error came from the transport layer.
    pub fn is_transport(&self) -> bool {
        matches!(self, NewsError::Transport(_))
    }

    /// Status code of an HTTP failure, if this is one.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            NewsError::Http(fault) => Some(fault.code()),
            _ => None,
        }
    }
}
