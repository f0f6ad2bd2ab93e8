//! Presentation layer: screen state, events and the view model.

mod connectivity;
mod state;
mod view_model;

pub use connectivity::{ConnectivityProbe, SocketConnectivityProbe, StaticConnectivity};
pub use state::{error_message, messages, UiEvent, UiState};
pub use view_model::{reduce, NewsSourcesViewModel, Transition};
