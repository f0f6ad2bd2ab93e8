//! HTTP client for the news API.
//!
//! The client is a `tower` middleware stack over `http` types with
//! [`NewsError`](crate::error::NewsError) as the error type.
//!
//! # Module Organization
//!
//! ```text
//! client/
//! ├── fetch          - NewsApiClient and body decoding
//! ├── config         - Client configuration
//! ├── auth           - API key and user agent headers
//! ├── error_handling - HTTP status classification
//! ├── logging        - Exchange logging with redaction
//! ├── cache_policy   - Cache-Control rewriting and response store
//! └── transport      - reqwest execution and fault classification
//! ```
//!
//! # Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`NewsApiClient`] | Composed client |
//! | [`ClientConfig`] | Configuration options |
//! | [`HttpStatusLayer`] | Failure status to [`HttpFault`](crate::error::HttpFault) |
//! | [`CachePolicyLayer`] | Request/response cache policy |
//! | [`HttpLoggingLayer`] | Redacting exchange logger |
//! | [`ReqwestTransport`] | Innermost service |

mod auth;
mod cache_policy;
mod config;
mod error_handling;
mod fetch;
mod logging;
mod transport;

pub use auth::{Authorization, AuthorizationLayer};
pub use cache_policy::{prepare_request, rewrite_response, CachePolicy, CachePolicyLayer};
pub use config::{CacheConfig, ClientConfig};
pub use error_handling::{classify_response, HttpStatus, HttpStatusLayer};
pub use fetch::{decode_body, HttpService, NewsApiClient};
pub use logging::{render_headers, HttpLogging, HttpLoggingLayer, LogLevel};
pub use transport::{classify_transport_error, ReqwestTransport};

use bytes::Bytes;

/// Request type flowing through the stack.
pub type HttpRequest = http::Request<Bytes>;

/// Response type flowing through the stack.
pub type HttpResponse = http::Response<Bytes>;
