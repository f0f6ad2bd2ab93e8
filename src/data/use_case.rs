//! Use case wrapping the repository.

use super::repository::{NewsSourcesRepository, SourcesStream};
use crate::scope::CancellationToken;
use std::sync::Arc;

/// Entry point the view model depends on.
pub trait GetNewsSourcesUseCase: Send + Sync {
    /// Fetch sources, optionally bypassing the cache.
    fn get_news_sources(&self, force_refresh: bool, cancel: CancellationToken) -> SourcesStream;
}

/// Delegates straight to a repository.
#[derive(Clone)]
pub struct DefaultGetNewsSourcesUseCase {
    repository: Arc<dyn NewsSourcesRepository>,
}

impl DefaultGetNewsSourcesUseCase {
    /// Use case over `repository`.
    pub fn new(repository: Arc<dyn NewsSourcesRepository>) -> Self {
        DefaultGetNewsSourcesUseCase { repository }
    }
}

impl GetNewsSourcesUseCase for DefaultGetNewsSourcesUseCase {
    fn get_news_sources(&self, force_refresh: bool, cancel: CancellationToken) -> SourcesStream {
        self.repository.get_sources(force_refresh, cancel)
    }
}
