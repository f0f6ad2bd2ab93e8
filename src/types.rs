//! Core value types shared by the data and UI layers.
//!
//! - [`Resource`] - four-way outcome of one fetch (`Loading`, `Success`, `Error`, `NoChange`)
//! - [`ErrorKind`] - closed error taxonomy handed to the UI
//! - [`NewsSource`] - the domain item
//! - [`ApiResponse`] - status plus optional decoded body, the input of the safe call

use serde::{Deserialize, Serialize};

/// Error category surfaced to the UI layer.
///
/// Decoupled from [`crate::error::Fault`] and [`crate::error::HttpFault`] so
/// consumers never see request/response internals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Host unresolved or connection refused.
    NoConnectivity,
    /// Connect or read timeout.
    Timeout,
    /// HTTP 401.
    Unauthorized,
    /// HTTP 403.
    Forbidden,
    /// HTTP 404.
    NotFound,
    /// HTTP 5xx.
    ServerError,
    /// Everything else.
    Unknown,
}

/// Outcome of one asynchronous fetch.
///
/// `Loading`, `Error` and `NoChange` carry no payload, so [`Resource::map`]
/// moves them across payload types unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resource<T> {
    /// The call completed with a payload.
    Success(T),
    /// The call failed and was classified.
    Error {
        /// Error category.
        kind: ErrorKind,
        /// Diagnostic message, if one was available.
        message: Option<String>,
        /// HTTP status for HTTP-level failures and empty bodies.
        code: Option<u16>,
    },
    /// The call is in flight.
    Loading,
    /// The server answered `304 Not Modified`.
    NoChange,
}

impl<T> Resource<T> {
    /// Shorthand for an `Error` value.
    pub fn error(kind: ErrorKind, message: impl Into<Option<String>>, code: Option<u16>) -> Self {
        Resource::Error {
            kind,
            message: message.into(),
            code,
        }
    }

    /// Transform the `Success` payload, passing every other variant through.
    ///
    /// # Examples
    ///
    /// ```
    /// use news_sources::Resource;
    ///
    /// let lengths = Resource::Success(vec![1, 2, 3]).map(|v| v.len());
    /// assert_eq!(lengths, Resource::Success(3));
    ///
    /// let pending: Resource<Vec<u8>> = Resource::Loading;
    /// assert_eq!(pending.map(|v| v.len()), Resource::Loading);
    /// ```
    pub fn map<U, F>(self, transform: F) -> Resource<U>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            Resource::Success(data) => Resource::Success(transform(data)),
            Resource::Error {
                kind,
                message,
                code,
            } => Resource::Error {
                kind,
                message,
                code,
            },
            Resource::Loading => Resource::Loading,
            Resource::NoChange => Resource::NoChange,
        }
    }

    /// Whether this value ends a fetch (`Success`, `Error` or `NoChange`).
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Resource::Loading)
    }

    /// Error category, if this is an `Error`.
    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            Resource::Error { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

/// A news source as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NewsSource {
    /// Stable identifier, e.g. `bbc-news`.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Short description; may be empty.
    pub description: String,
    /// Homepage URL.
    pub url: String,
}

/// Status and optional body of a completed call.
///
/// `body` is `None` for `304` responses and for empty success bodies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse<T> {
    /// HTTP status code.
    pub status: u16,
    /// Decoded body.
    pub body: Option<T>,
}

impl<T> ApiResponse<T> {
    /// Response carrying a body.
    pub fn with_body(status: u16, body: T) -> Self {
        ApiResponse {
            status,
            body: Some(body),
        }
    }

    /// Response without a body.
    pub fn empty(status: u16) -> Self {
        ApiResponse { status, body: None }
    }
}
