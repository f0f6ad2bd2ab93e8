//! Attaches the API key and user agent to every outgoing request.

use super::{HttpRequest, HttpResponse};
use crate::error::{NewsError, Result};
use crate::protocol::constants::headers::{USER_AGENT, X_API_KEY};
use http::HeaderValue;
use std::task::{Context, Poll};
use tower::{Layer, Service};

/// Layer producing [`Authorization`].
#[derive(Clone, Debug)]
pub struct AuthorizationLayer {
    api_key: HeaderValue,
    user_agent: HeaderValue,
}

impl AuthorizationLayer {
    /// Fails when either value is not a valid header value.
    pub fn new(api_key: &str, user_agent: &str) -> Result<Self> {
        let mut api_key = HeaderValue::from_str(api_key)
            .map_err(|e| NewsError::Config(format!("invalid API key: {}", e)))?;
        api_key.set_sensitive(true);
        let user_agent = HeaderValue::from_str(user_agent)
            .map_err(|e| NewsError::Config(format!("invalid user agent: {}", e)))?;
        Ok(AuthorizationLayer {
            api_key,
            user_agent,
        })
    }
}

impl<S> Layer<S> for AuthorizationLayer {
    type Service = Authorization<S>;

    fn layer(&self, inner: S) -> Self::Service {
        Authorization {
            inner,
            api_key: self.api_key.clone(),
            user_agent: self.user_agent.clone(),
        }
    }
}

/// Overwrites `x-api-key` and `User-Agent` on each request.
#[derive(Clone, Debug)]
pub struct Authorization<S> {
    inner: S,
    api_key: HeaderValue,
    user_agent: HeaderValue,
}

impl<S> Service<HttpRequest> for Authorization<S>
where
    S: Service<HttpRequest, Response = HttpResponse, Error = NewsError>,
{
    type Response = HttpResponse;
    type Error = NewsError;
    type Future = S::Future;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<()>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: HttpRequest) -> Self::Future {
        let headers = request.headers_mut();
        headers.insert(X_API_KEY, self.api_key.clone());
        headers.insert(USER_AGENT, self.user_agent.clone());
        self.inner.call(request)
    }
}
