//! Converts a network call's outcome into a [`Resource`].
//!
//! | Outcome | Resource |
//! |---------|----------|
//! | status `304` | `NoChange` |
//! | body present | `Success(body)` |
//! | no body | `Error(Unknown, "Empty response body!", status)` |
//! | [`Fault::NoConnectivity`] | `Error(NoConnectivity, cause, -)` |
//! | [`Fault::Timeout`] | `Error(Timeout, cause, -)` |
//! | [`HttpFault`] | kind by status, fault message, status |
//! | anything else | `Error(Unknown, description, -)` |
//!
//! Cancellation is not an outcome: it comes back as `Err(Cancelled)` so the
//! caller can stop without producing a value.

use crate::error::{Fault, HttpFault, NewsError, Result};
use crate::types::{ApiResponse, ErrorKind, Resource};
use std::future::Future;
use thiserror::Error;

/// Message attached when a completed call carried no body.
pub const EMPTY_BODY_MESSAGE: &str = "Empty response body!";

/// The call was cancelled by its owning scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("call cancelled")]
pub struct Cancelled;

/// Await `call` and classify its outcome.
///
/// # Examples
///
/// ```
/// use news_sources::data::safe_api_call;
/// use news_sources::{ApiResponse, Resource};
///
/// # tokio_test::block_on(async {
/// let resource = safe_api_call(async { Ok(ApiResponse::with_body(200, 42)) }).await;
/// assert_eq!(resource, Ok(Resource::Success(42)));
///
/// let resource = safe_api_call(async { Ok(ApiResponse::<u32>::empty(304)) }).await;
/// assert_eq!(resource, Ok(Resource::NoChange));
/// # });
/// ```
pub async fn safe_api_call<T, F>(call: F) -> std::result::Result<Resource<T>, Cancelled>
where
    F: Future<Output = Result<ApiResponse<T>>>,
{
    match call.await {
        Ok(ApiResponse { status: 304, .. }) => Ok(Resource::NoChange),
        Ok(ApiResponse {
            body: Some(body), ..
        }) => Ok(Resource::Success(body)),
        Ok(ApiResponse { status, body: None }) => Ok(Resource::error(
            ErrorKind::Unknown,
            EMPTY_BODY_MESSAGE.to_string(),
            Some(status),
        )),
        Err(NewsError::Cancelled) => Err(Cancelled),
        Err(error) => {
            let resource = classify_error(error);
            if let Resource::Error { kind, code, .. } = &resource {
                tracing::debug!(?kind, ?code, "call failed");
            }
            Ok(resource)
        }
    }
}

fn classify_error<T>(error: NewsError) -> Resource<T> {
    match error {
        NewsError::Transport(fault) => {
            let kind = match fault {
                Fault::NoConnectivity(_) => ErrorKind::NoConnectivity,
                Fault::Timeout(_) => ErrorKind::Timeout,
                Fault::Unknown(_) => ErrorKind::Unknown,
            };
            Resource::error(kind, fault.describe(), None)
        }
        NewsError::Http(fault) => {
            let kind = match fault {
                HttpFault::Unauthorized(_) => ErrorKind::Unauthorized,
                HttpFault::Forbidden(_) => ErrorKind::Forbidden,
                HttpFault::NotFound(_) => ErrorKind::NotFound,
                HttpFault::ServerError { .. } => ErrorKind::ServerError,
                HttpFault::Unknown { .. } => ErrorKind::Unknown,
            };
            Resource::error(kind, fault.message().to_string(), Some(fault.code()))
        }
        other => Resource::error(ErrorKind::Unknown, other.to_string(), None),
    }
}
