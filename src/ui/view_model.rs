//! News sources view model.
//!
//! Owns two channels with different delivery rules:
//!
//! | Channel | Primitive | Semantics |
//! |---------|-----------|-----------|
//! | state | `tokio::sync::watch` | latest value, replayed to new observers |
//! | events | `tokio::sync::broadcast` | fire-and-forget, only attached observers receive |
//!
//! Fetches run on the I/O runtime handle passed at construction and are
//! cancelled by [`NewsSourcesViewModel::clear`] or when the view model is
//! dropped.

use super::connectivity::ConnectivityProbe;
use super::state::{error_message, messages, UiEvent, UiState};
use crate::data::GetNewsSourcesUseCase;
use crate::scope::{CancellationToken, CancellationTrigger};
use crate::types::{NewsSource, Resource};
use futures::{Stream, StreamExt};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::BroadcastStream;

/// Events buffered for slow observers before they start lagging.
const EVENT_CAPACITY: usize = 16;

/// What one stream value does to the screen.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Transition {
    /// New state, if it changes.
    pub state: Option<UiState>,
    /// Event to emit, if any.
    pub event: Option<UiEvent>,
}

/// Pure reduction of one repository value against the current state.
///
/// # Examples
///
/// ```
/// use news_sources::ui::{reduce, UiEvent, UiState};
/// use news_sources::{ErrorKind, NewsSource, Resource};
///
/// let shown = UiState::Success(vec![NewsSource {
///     id: "bbc-news".into(),
///     name: "BBC News".into(),
///     description: String::new(),
///     url: "https://bbc.co.uk".into(),
/// }]);
///
/// let t = reduce(&shown, Resource::error(ErrorKind::Timeout, None, None));
/// assert_eq!(t.state, None);
/// assert_eq!(t.event, Some(UiEvent::Error("Request timed out!".into())));
/// ```
pub fn reduce(current: &UiState, resource: Resource<Vec<NewsSource>>) -> Transition {
    match resource {
        Resource::Loading => Transition::default(),
        Resource::Success(sources) if sources.is_empty() => Transition {
            state: Some(UiState::Empty),
            event: None,
        },
        Resource::Success(sources) => Transition {
            state: Some(UiState::Success(sources)),
            event: None,
        },
        Resource::Error { kind, .. } => Transition {
            // A transient error keeps a list already on screen.
            state: match current {
                UiState::Success(_) => None,
                _ => Some(UiState::Empty),
            },
            event: Some(UiEvent::Error(error_message(kind).to_string())),
        },
        Resource::NoChange => Transition {
            state: None,
            event: Some(UiEvent::no_change()),
        },
    }
}

/// Drives the sources screen.
pub struct NewsSourcesViewModel {
    use_case: Arc<dyn GetNewsSourcesUseCase>,
    connectivity: Arc<dyn ConnectivityProbe>,
    io: Handle,
    state: Arc<watch::Sender<UiState>>,
    events: broadcast::Sender<UiEvent>,
    scope: CancellationTrigger,
}

impl NewsSourcesViewModel {
    /// View model running fetches on `io`. Initial state is [`UiState::Empty`].
    pub fn new(
        use_case: Arc<dyn GetNewsSourcesUseCase>,
        connectivity: Arc<dyn ConnectivityProbe>,
        io: Handle,
    ) -> Self {
        let (state, _) = watch::channel(UiState::Empty);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let (_, scope) = CancellationToken::new();
        NewsSourcesViewModel {
            use_case,
            connectivity,
            io,
            state: Arc::new(state),
            events,
            scope,
        }
    }

    /// Current state.
    pub fn state(&self) -> UiState {
        self.state.borrow().clone()
    }

    /// Observe state; the receiver starts at the current value.
    pub fn subscribe_state(&self) -> watch::Receiver<UiState> {
        self.state.subscribe()
    }

    /// Observe events emitted from now on.
    pub fn subscribe_events(&self) -> broadcast::Receiver<UiEvent> {
        self.events.subscribe()
    }

    /// Events emitted from now on, as a stream. Lagged events are skipped.
    pub fn event_stream(&self) -> impl Stream<Item = UiEvent> + Send + 'static {
        BroadcastStream::new(self.events.subscribe())
            .filter_map(|event| futures::future::ready(event.ok()))
    }

    /// First load, served from cache when possible.
    pub fn load_initial(&self) -> JoinHandle<()> {
        self.fetch(false)
    }

    /// User refresh. Returns `None` when the connectivity probe fails, in
    /// which case an error event is emitted and no request is made.
    pub fn refresh(&self) -> Option<JoinHandle<()>> {
        if !self.connectivity.has_connectivity() {
            tracing::info!("refresh skipped: no connectivity");
            emit(&self.events, UiEvent::Error(messages::NETWORK_ISSUE.to_string()));
            return None;
        }
        emit(&self.events, UiEvent::refresh_started());
        Some(self.fetch(true))
    }

    /// Emit an informational message.
    pub fn show_message(&self, message: impl Into<String>) {
        emit(&self.events, UiEvent::ShowMessage(message.into()));
    }

    /// Cancel all in-flight and future fetches.
    pub fn clear(&self) {
        self.scope.cancel();
    }

    fn fetch(&self, force_refresh: bool) -> JoinHandle<()> {
        let token = self.scope.token();
        let stream = self.use_case.get_news_sources(force_refresh, token.clone());
        let state = Arc::clone(&self.state);
        let events = self.events.clone();

        if !force_refresh && !token.is_cancelled() {
            state.send_replace(UiState::Loading);
        }

        self.io.spawn(async move {
            let mut stream = stream;
            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => {
                        tracing::debug!(force_refresh, "fetch abandoned");
                        return;
                    }
                    next = stream.next() => match next {
                        Some(resource) => apply(&state, &events, resource),
                        None => break,
                    },
                }
            }
            if force_refresh {
                emit(&events, UiEvent::refresh_completed());
            }
        })
    }
}

impl Drop for NewsSourcesViewModel {
    fn drop(&mut self) {
        self.scope.cancel();
    }
}

/// Reduce under the state lock so overlapping fetches never decide against
/// a value another fetch is replacing.
fn apply(state: &watch::Sender<UiState>, events: &broadcast::Sender<UiEvent>, resource: Resource<Vec<NewsSource>>) {
    let mut event = None;
    state.send_if_modified(|current| {
        let transition = reduce(current, resource);
        event = transition.event;
        match transition.state {
            Some(next) => {
                *current = next;
                true
            }
            None => false,
        }
    });
    if let Some(event) = event {
        emit(events, event);
    }
}

fn emit(events: &broadcast::Sender<UiEvent>, event: UiEvent) {
    // No receivers means nobody is listening; the event is dropped.
    if events.send(event).is_err() {
        tracing::trace!("event dropped: no observers");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{DefaultGetNewsSourcesUseCase, NewsSourcesRepository, SourcesStream};
    use crate::types::ErrorKind;
    use crate::ui::connectivity::StaticConnectivity;
    use futures::stream;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::time::Duration;
    use tokio::sync::broadcast::error::TryRecvError;

    /// Repository emitting `Loading` then the next scripted terminal value.
    #[derive(Default)]
    struct ScriptedRepository {
        terminals: Mutex<VecDeque<Resource<Vec<NewsSource>>>>,
        calls: Mutex<Vec<bool>>,
        hang: bool,
    }

    impl ScriptedRepository {
        fn with(terminals: Vec<Resource<Vec<NewsSource>>>) -> Arc<Self> {
            Arc::new(ScriptedRepository {
                terminals: Mutex::new(terminals.into()),
                ..Default::default()
            })
        }

        fn hanging() -> Arc<Self> {
            Arc::new(ScriptedRepository {
                hang: true,
                ..Default::default()
            })
        }
    }

    impl NewsSourcesRepository for ScriptedRepository {
        fn get_sources(&self, force_refresh: bool, _cancel: CancellationToken) -> SourcesStream {
            self.calls.lock().push(force_refresh);
            if self.hang {
                return stream::once(async { Resource::Loading })
                    .chain(stream::pending())
                    .boxed();
            }
            let terminal = self
                .terminals
                .lock()
                .pop_front()
                .unwrap_or(Resource::NoChange);
            stream::iter(vec![Resource::Loading, terminal]).boxed()
        }
    }

    fn source(id: &str) -> NewsSource {
        NewsSource {
            id: id.to_string(),
            name: id.to_string(),
            description: String::new(),
            url: format!("https://{}.example", id),
        }
    }

    fn view_model(repository: Arc<ScriptedRepository>, online: bool) -> NewsSourcesViewModel {
        NewsSourcesViewModel::new(
            Arc::new(DefaultGetNewsSourcesUseCase::new(repository)),
            Arc::new(StaticConnectivity(online)),
            Handle::current(),
        )
    }

    fn drain(events: &mut broadcast::Receiver<UiEvent>) -> Vec<UiEvent> {
        let mut out = Vec::new();
        loop {
            match events.try_recv() {
                Ok(event) => out.push(event),
                Err(TryRecvError::Lagged(_)) => continue,
                Err(_) => return out,
            }
        }
    }

    #[test]
    fn test_reduce_success() {
        let t = reduce(&UiState::Loading, Resource::Success(vec![source("cnn")]));
        assert_eq!(t.state, Some(UiState::Success(vec![source("cnn")])));
        assert_eq!(t.event, None);
    }

    #[test]
    fn test_reduce_empty_success_is_empty() {
        let t = reduce(&UiState::Loading, Resource::Success(vec![]));
        assert_eq!(t.state, Some(UiState::Empty));
    }

    #[test]
    fn test_reduce_error_without_data_empties() {
        let t = reduce(&UiState::Loading, Resource::error(ErrorKind::NotFound, None, Some(404)));
        assert_eq!(t.state, Some(UiState::Empty));
        assert_eq!(
            t.event,
            Some(UiEvent::Error("Resource that you are looking for not found!".to_string()))
        );
    }

    #[test]
    fn test_reduce_no_change_keeps_state() {
        let t = reduce(&UiState::Success(vec![source("a")]), Resource::NoChange);
        assert_eq!(t.state, None);
        assert_eq!(t.event, Some(UiEvent::no_change()));
    }

    #[test]
    fn test_reduce_loading_is_noop() {
        assert_eq!(reduce(&UiState::Empty, Resource::Loading), Transition::default());
    }

    #[test]
    fn test_overlapping_error_never_blanks_success() {
        for _ in 0..2_000 {
            let (state, _) = watch::channel(UiState::Empty);
            let (events, _) = broadcast::channel(EVENT_CAPACITY);
            let barrier = std::sync::Barrier::new(2);

            std::thread::scope(|s| {
                s.spawn(|| {
                    barrier.wait();
                    apply(&state, &events, Resource::Success(vec![source("a")]));
                });
                s.spawn(|| {
                    barrier.wait();
                    apply(&state, &events, Resource::error(ErrorKind::ServerError, None, Some(503)));
                });
            });

            assert_eq!(*state.borrow(), UiState::Success(vec![source("a")]));
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_overlapping_fetches_keep_loaded_list() {
        let repository = ScriptedRepository::with(vec![
            Resource::Success(vec![source("a")]),
            Resource::error(ErrorKind::Timeout, None, None),
        ]);
        let vm = view_model(repository, true);

        let initial = vm.load_initial();
        let refresh = vm.refresh().unwrap();
        initial.await.unwrap();
        refresh.await.unwrap();

        assert_eq!(vm.state(), UiState::Success(vec![source("a")]));
    }

    #[tokio::test]
    async fn test_load_initial_success() {
        let repository = ScriptedRepository::with(vec![Resource::Success(vec![source("bbc-news"), source("cnn")])]);
        let vm = view_model(repository.clone(), true);
        let mut states = vm.subscribe_state();

        let handle = vm.load_initial();
        assert_eq!(*states.borrow_and_update(), UiState::Loading);
        handle.await.unwrap();

        match vm.state() {
            UiState::Success(sources) => {
                assert_eq!(sources.len(), 2);
                assert_eq!(sources[0].id, "bbc-news");
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(*repository.calls.lock(), vec![false]);
    }

    #[tokio::test]
    async fn test_error_keeps_existing_list_and_emits_once() {
        let repository = ScriptedRepository::with(vec![
            Resource::Success(vec![source("a")]),
            Resource::error(ErrorKind::ServerError, None, Some(503)),
        ]);
        let vm = view_model(repository, true);
        vm.load_initial().await.unwrap();

        let mut events = vm.subscribe_events();
        vm.refresh().unwrap().await.unwrap();

        assert_eq!(vm.state(), UiState::Success(vec![source("a")]));
        let events = drain(&mut events);
        let errors: Vec<_> = events.iter().filter(|e| matches!(e, UiEvent::Error(_))).collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].text(), messages::SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_refresh_event_order() {
        let repository = ScriptedRepository::with(vec![Resource::NoChange]);
        let vm = view_model(repository.clone(), true);
        let mut events = vm.subscribe_events();

        vm.refresh().unwrap().await.unwrap();

        assert_eq!(
            drain(&mut events),
            vec![
                UiEvent::refresh_started(),
                UiEvent::no_change(),
                UiEvent::refresh_completed()
            ]
        );
        // Forced fetches do not flash the loading state.
        assert_eq!(vm.state(), UiState::Empty);
        assert_eq!(*repository.calls.lock(), vec![true]);
    }

    #[tokio::test]
    async fn test_refresh_offline_short_circuits() {
        let repository = ScriptedRepository::with(vec![]);
        let vm = view_model(repository.clone(), false);
        let mut events = vm.subscribe_events();

        assert!(vm.refresh().is_none());

        assert_eq!(
            drain(&mut events),
            vec![UiEvent::Error(messages::NETWORK_ISSUE.to_string())]
        );
        assert!(repository.calls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_events_not_replayed() {
        let vm = view_model(ScriptedRepository::with(vec![]), true);
        vm.show_message("before");

        let mut late = vm.subscribe_events();
        assert!(matches!(late.try_recv(), Err(TryRecvError::Empty)));

        vm.show_message("after");
        assert_eq!(late.try_recv().unwrap(), UiEvent::ShowMessage("after".to_string()));
    }

    #[tokio::test]
    async fn test_state_replayed_to_new_observers() {
        let repository = ScriptedRepository::with(vec![Resource::Success(vec![source("x")])]);
        let vm = view_model(repository, true);
        vm.load_initial().await.unwrap();

        let late = vm.subscribe_state();
        assert_eq!(*late.borrow(), UiState::Success(vec![source("x")]));
    }

    #[tokio::test]
    async fn test_event_stream() {
        let vm = view_model(ScriptedRepository::with(vec![]), true);
        let mut stream = Box::pin(vm.event_stream());
        vm.show_message("hello");
        let event = tokio::time::timeout(Duration::from_secs(1), stream.next()).await.unwrap();
        assert_eq!(event, Some(UiEvent::ShowMessage("hello".to_string())));
    }

    #[tokio::test]
    async fn test_clear_cancels_in_flight_fetch() {
        let vm = view_model(ScriptedRepository::hanging(), true);
        let mut events = vm.subscribe_events();

        let handle = vm.refresh().unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        vm.clear();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
        // Cancelled refreshes never report completion.
        assert_eq!(drain(&mut events), vec![UiEvent::refresh_started()]);
    }

    #[tokio::test]
    async fn test_drop_cancels_in_flight_fetch() {
        let vm = view_model(ScriptedRepository::hanging(), true);
        let handle = vm.load_initial();
        drop(vm);
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
