//! The news API client.
//!
//! # Examples
//!
//! ```ignore
//! use news_sources::client::{ClientConfig, NewsApiClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = NewsApiClient::new(ClientConfig::from_env()?).await?;
//!     let response = client.get_sources(false).await?;
//!     if let Some(body) = response.body {
//!         println!("{} sources", body.sources.len());
//!     }
//!     Ok(())
//! }
//! ```

use super::auth::AuthorizationLayer;
use super::cache_policy::CachePolicyLayer;
use super::config::{CacheConfig, ClientConfig};
use super::error_handling::HttpStatusLayer;
use super::logging::HttpLoggingLayer;
use super::transport::ReqwestTransport;
use super::{HttpRequest, HttpResponse};
use crate::cache::{DiskCache, MemoryCache, ResponseCache};
use crate::data::dto::SourcesResponseDto;
use crate::error::{NewsError, Result};
use crate::protocol::constants::{endpoints, headers::X_FORCE_REFRESH, FORCE_REFRESH_VALUE};
use crate::types::ApiResponse;
use bytes::Bytes;
use http::{Method, StatusCode};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tower::util::BoxCloneService;
use tower::{Service, ServiceBuilder, ServiceExt};
use url::Url;

/// The composed middleware stack.
pub type HttpService = BoxCloneService<HttpRequest, HttpResponse, NewsError>;

/// Client for the news API.
///
/// Every request runs through, outermost first:
///
/// ```text
/// Authorization -> HttpStatus -> HttpLogging -> CachePolicy -> transport
/// ```
///
/// Cloning is cheap; clones share the transport and response store.
#[derive(Clone)]
pub struct NewsApiClient {
    // `BoxCloneService` is `Send` but not `Sync`; each call clones it out.
    service: Arc<Mutex<HttpService>>,
    base_url: Url,
    config: Arc<ClientConfig>,
}

impl NewsApiClient {
    /// Build a client with a `reqwest` transport and the configured store.
    pub async fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let store: Option<Arc<dyn ResponseCache>> = match &config.cache {
            CacheConfig::Disabled => None,
            CacheConfig::Memory { max_bytes } => Some(Arc::new(MemoryCache::new(*max_bytes))),
            CacheConfig::Disk { dir, max_bytes } => {
                Some(Arc::new(DiskCache::open(dir.clone(), *max_bytes).await?))
            }
        };
        let transport = ReqwestTransport::new(&config)?;
        Self::with_transport(config, transport, store)
    }

    /// Build a client over any transport service.
    pub fn with_transport<T>(
        config: ClientConfig,
        transport: T,
        store: Option<Arc<dyn ResponseCache>>,
    ) -> Result<Self>
    where
        T: Service<HttpRequest, Response = HttpResponse, Error = NewsError> + Clone + Send + 'static,
        T::Future: Send + 'static,
    {
        config.validate()?;
        let base_url = config.parsed_base_url()?;

        let cache_policy = match store {
            Some(store) => CachePolicyLayer::new(store),
            None => CachePolicyLayer::without_store(),
        }
        .override_origin_no_store(config.override_origin_no_store);

        let service = ServiceBuilder::new()
            .layer(AuthorizationLayer::new(&config.api_key, &config.user_agent)?)
            .layer(HttpStatusLayer::new())
            .layer(HttpLoggingLayer::new(config.log_level()))
            .layer(cache_policy)
            .service(transport);

        tracing::debug!(base_url = %base_url, cache = ?config.cache, "news API client ready");

        Ok(NewsApiClient {
            service: Arc::new(Mutex::new(BoxCloneService::new(service))),
            base_url,
            config: Arc::new(config),
        })
    }

    /// Configuration the client was built with.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Run a request through the full stack.
    pub async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        let service = self.service.lock().clone();
        service.oneshot(request).await
    }

    /// Build the sources request. The force-refresh marker is only attached when forcing.
    pub fn sources_request(&self, force_refresh: bool) -> Result<HttpRequest> {
        let url = self
            .base_url
            .join(endpoints::SOURCES)
            .map_err(|e| NewsError::InvalidRequest(format!("{}: {}", endpoints::SOURCES, e)))?;

        let mut builder = http::Request::builder().method(Method::GET).uri(url.as_str());
        if force_refresh {
            builder = builder.header(X_FORCE_REFRESH, FORCE_REFRESH_VALUE);
        }
        builder
            .body(Bytes::new())
            .map_err(|e| NewsError::InvalidRequest(e.to_string()))
    }

    /// Fetch the news sources listing.
    pub async fn get_sources(&self, force_refresh: bool) -> Result<ApiResponse<SourcesResponseDto>> {
        let response = self.execute(self.sources_request(force_refresh)?).await?;
        decode_body(response)
    }
}

/// Decode a response that already passed status classification.
///
/// `304` and empty bodies produce [`ApiResponse::empty`].
pub fn decode_body<T: DeserializeOwned>(response: HttpResponse) -> Result<ApiResponse<T>> {
    let status = response.status();
    if status == StatusCode::NOT_MODIFIED || response.body().is_empty() {
        return Ok(ApiResponse::empty(status.as_u16()));
    }
    let body = serde_json::from_slice(response.body())?;
    Ok(ApiResponse::with_body(status.as_u16(), body))
}
