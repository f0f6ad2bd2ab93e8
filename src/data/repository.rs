//! Sources repository.
//!
//! Each fetch is a short stream: `Loading`, then exactly one of `Success`,
//! `Error` or `NoChange`. If the fetch is cancelled the stream ends after
//! `Loading` without a terminal value.

use super::mapper::to_domain_list;
use super::remote::RemoteDataSource;
use super::safe_call::{safe_api_call, Cancelled};
use crate::scope::CancellationToken;
use crate::types::{NewsSource, Resource};
use futures::stream::{self, BoxStream, StreamExt};
use std::sync::Arc;

/// Stream of fetch states.
pub type SourcesStream = BoxStream<'static, Resource<Vec<NewsSource>>>;

/// Repository of news sources.
pub trait NewsSourcesRepository: Send + Sync {
    /// Start a fetch. Nothing happens until the stream is polled.
    fn get_sources(&self, force_refresh: bool, cancel: CancellationToken) -> SourcesStream;
}

/// Repository backed by a [`RemoteDataSource`].
#[derive(Clone)]
pub struct DefaultNewsSourcesRepository {
    remote: Arc<dyn RemoteDataSource>,
}

impl DefaultNewsSourcesRepository {
    /// Repository over `remote`.
    pub fn new(remote: Arc<dyn RemoteDataSource>) -> Self {
        DefaultNewsSourcesRepository { remote }
    }
}

impl NewsSourcesRepository for DefaultNewsSourcesRepository {
    fn get_sources(&self, force_refresh: bool, cancel: CancellationToken) -> SourcesStream {
        let remote = Arc::clone(&self.remote);

        let terminal = async move {
            let call = cancel.guard(remote.get_sources(force_refresh));
            match safe_api_call(call).await {
                Ok(resource) => Some(resource.map(|dto| to_domain_list(dto.sources))),
                Err(Cancelled) => {
                    tracing::debug!(force_refresh, "sources fetch cancelled");
                    None
                }
            }
        };

        stream::once(futures::future::ready(Resource::Loading))
            .chain(stream::once(terminal).filter_map(futures::future::ready))
            .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::dto::{NewsSourceDto, SourcesResponseDto};
    use crate::error::{Fault, FaultDetails, HttpFault, NewsError, Result};
    use crate::types::{ApiResponse, ErrorKind};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::time::Duration;

    /// Remote returning one scripted outcome per call, optionally after a delay.
    struct FakeRemote {
        outcome: Mutex<Option<Result<ApiResponse<SourcesResponseDto>>>>,
        delay: Duration,
        forced: Mutex<Vec<bool>>,
    }

    impl FakeRemote {
        fn new(outcome: Result<ApiResponse<SourcesResponseDto>>) -> Arc<Self> {
            Arc::new(FakeRemote {
                outcome: Mutex::new(Some(outcome)),
                delay: Duration::ZERO,
                forced: Mutex::new(Vec::new()),
            })
        }

        fn slow() -> Arc<Self> {
            Arc::new(FakeRemote {
                outcome: Mutex::new(Some(Ok(ApiResponse::empty(200)))),
                delay: Duration::from_secs(60),
                forced: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl RemoteDataSource for FakeRemote {
        async fn get_sources(&self, force_refresh: bool) -> Result<ApiResponse<SourcesResponseDto>> {
            self.forced.lock().push(force_refresh);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            let outcome = self.outcome.lock().take();
            outcome.unwrap_or_else(|| Err(Fault::unknown("exhausted").into()))
        }
    }

    fn dto(ids: &[&str]) -> SourcesResponseDto {
        SourcesResponseDto {
            status: "ok".to_string(),
            sources: ids
                .iter()
                .map(|id| NewsSourceDto {
                    id: id.to_string(),
                    name: id.to_uppercase(),
                    description: String::new(),
                    url: format!("https://{}.example", id),
                })
                .collect(),
        }
    }

    async fn collect(remote: Arc<FakeRemote>, force: bool) -> Vec<Resource<Vec<NewsSource>>> {
        DefaultNewsSourcesRepository::new(remote)
            .get_sources(force, CancellationToken::never())
            .collect()
            .await
    }

    #[tokio::test]
    async fn test_loading_then_success() {
        let items = collect(FakeRemote::new(Ok(ApiResponse::with_body(200, dto(&["a", "b"])))), false).await;
        assert_eq!(items.len(), 2);
        assert_eq!(items[0], Resource::Loading);
        match &items[1] {
            Resource::Success(sources) => {
                assert_eq!(sources.len(), 2);
                assert_eq!(sources[0].id, "a");
                assert_eq!(sources[1].name, "B");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_body_is_unknown_error() {
        let items = collect(FakeRemote::new(Ok(ApiResponse::empty(200))), false).await;
        assert_eq!(items[1].error_kind(), Some(ErrorKind::Unknown));
    }

    #[tokio::test]
    async fn test_not_modified() {
        let items = collect(FakeRemote::new(Ok(ApiResponse::empty(304))), true).await;
        assert_eq!(items, vec![Resource::Loading, Resource::NoChange]);
    }

    #[tokio::test]
    async fn test_transport_errors() {
        let items = collect(FakeRemote::new(Err(Fault::no_connectivity("dns").into())), false).await;
        assert_eq!(items[1].error_kind(), Some(ErrorKind::NoConnectivity));

        let items = collect(FakeRemote::new(Err(Fault::timeout("read").into())), false).await;
        assert_eq!(items[1].error_kind(), Some(ErrorKind::Timeout));
    }

    #[tokio::test]
    async fn test_http_errors() {
        for (code, kind) in [
            (401, ErrorKind::Unauthorized),
            (403, ErrorKind::Forbidden),
            (404, ErrorKind::NotFound),
            (502, ErrorKind::ServerError),
        ] {
            let fault: NewsError = HttpFault::from_status(code, FaultDetails::with_message("x")).into();
            let items = collect(FakeRemote::new(Err(fault)), false).await;
            assert_eq!(items.len(), 2);
            assert_eq!(items[1].error_kind(), Some(kind));
        }
    }

    #[tokio::test]
    async fn test_force_refresh_forwarded() {
        let remote = FakeRemote::new(Ok(ApiResponse::with_body(200, dto(&[]))));
        collect(Arc::clone(&remote), true).await;
        assert_eq!(*remote.forced.lock(), vec![true]);
    }

    #[tokio::test]
    async fn test_nothing_runs_until_polled() {
        let remote = FakeRemote::new(Ok(ApiResponse::with_body(200, dto(&[]))));
        let stream = DefaultNewsSourcesRepository::new(remote.clone())
            .get_sources(false, CancellationToken::never());
        assert!(remote.forced.lock().is_empty());
        drop(stream);
    }

    #[tokio::test]
    async fn test_cancelled_fetch_ends_after_loading() {
        let (token, trigger) = CancellationToken::new();
        let mut stream = DefaultNewsSourcesRepository::new(FakeRemote::slow()).get_sources(false, token);

        assert_eq!(stream.next().await, Some(Resource::Loading));
        trigger.cancel();
        let next = tokio::time::timeout(Duration::from_secs(1), stream.next()).await.unwrap();
        assert_eq!(next, None);
    }
}
