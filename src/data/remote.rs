//! Remote data source seam.

use super::dto::SourcesResponseDto;
use crate::client::NewsApiClient;
use crate::error::Result;
use crate::types::ApiResponse;
use async_trait::async_trait;

/// Source of raw sources listings.
#[async_trait]
pub trait RemoteDataSource: Send + Sync {
    /// Fetch the listing; `force_refresh` bypasses the local cache.
    async fn get_sources(&self, force_refresh: bool) -> Result<ApiResponse<SourcesResponseDto>>;
}

#[async_trait]
impl RemoteDataSource for NewsApiClient {
    async fn get_sources(&self, force_refresh: bool) -> Result<ApiResponse<SourcesResponseDto>> {
        NewsApiClient::get_sources(self, force_refresh).await
    }
}
