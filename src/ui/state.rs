//! Screen state, one-shot events and their texts.

use crate::types::{ErrorKind, NewsSource};

/// User-facing texts.
pub mod messages {
    /// Shown for [`ErrorKind::Unauthorized`](crate::ErrorKind::Unauthorized).
    pub const AUTHORIZATION_FAILED: &str = "Unauthorized request";
    /// Shown for [`ErrorKind::Forbidden`](crate::ErrorKind::Forbidden).
    pub const FORBIDDEN_REQUEST: &str = "Forbidden request";
    /// Shown for [`ErrorKind::NotFound`](crate::ErrorKind::NotFound).
    pub const NOT_FOUND: &str = "Resource that you are looking for not found!";
    /// Shown for [`ErrorKind::ServerError`](crate::ErrorKind::ServerError).
    pub const SERVER_ERROR: &str = "An unexpected server error occurred, please try after sometime.";
    /// Shown for [`ErrorKind::NoConnectivity`](crate::ErrorKind::NoConnectivity) and when a refresh finds no network.
    pub const NETWORK_ISSUE: &str = "Network issue occurred. Check your connection.";
    /// Shown for [`ErrorKind::Timeout`](crate::ErrorKind::Timeout).
    pub const CONNECTION_TIME_OUT: &str = "Request timed out!";
    /// Shown for [`ErrorKind::Unknown`](crate::ErrorKind::Unknown).
    pub const UNKNOWN_ERROR: &str = "Something went wrong.";

    /// Default text of [`UiEvent::NoChange`](super::UiEvent::NoChange).
    pub const NO_CHANGE: &str = "No change in data!";
    /// Default text of [`UiEvent::RefreshStarted`](super::UiEvent::RefreshStarted).
    pub const REFRESH_STARTED: &str = "Refresh started!";
    /// Default text of [`UiEvent::RefreshCompleted`](super::UiEvent::RefreshCompleted).
    pub const REFRESH_COMPLETED: &str = "Refresh Completed!";
}

/// Text shown for an error category.
pub fn error_message(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::Unauthorized => messages::AUTHORIZATION_FAILED,
        ErrorKind::Forbidden => messages::FORBIDDEN_REQUEST,
        ErrorKind::NotFound => messages::NOT_FOUND,
        ErrorKind::ServerError => messages::SERVER_ERROR,
        ErrorKind::NoConnectivity => messages::NETWORK_ISSUE,
        ErrorKind::Timeout => messages::CONNECTION_TIME_OUT,
        ErrorKind::Unknown => messages::UNKNOWN_ERROR,
    }
}

/// Persistent screen state. Observers always see the latest value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum UiState {
    /// Non-empty list of sources.
    Success(Vec<NewsSource>),
    /// A fetch is running and nothing is shown yet.
    Loading,
    /// Nothing to show.
    #[default]
    Empty,
}

/// One-shot notification. Lost if nobody is listening.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    /// Informational text.
    ShowMessage(String),
    /// A fetch failed.
    Error(String),
    /// The server reported no change.
    NoChange(String),
    /// A user refresh began.
    RefreshStarted(String),
    /// A user refresh finished.
    RefreshCompleted(String),
}

impl UiEvent {
    /// `NoChange` with its default text.
    pub fn no_change() -> Self {
        UiEvent::NoChange(messages::NO_CHANGE.to_string())
    }

    /// `RefreshStarted` with its default text.
    pub fn refresh_started() -> Self {
        UiEvent::RefreshStarted(messages::REFRESH_STARTED.to_string())
    }

    /// `RefreshCompleted` with its default text.
    pub fn refresh_completed() -> Self {
        UiEvent::RefreshCompleted(messages::REFRESH_COMPLETED.to_string())
    }

    /// The carried text.
    pub fn text(&self) -> &str {
        match self {
            UiEvent::ShowMessage(text)
            | UiEvent::Error(text)
            | UiEvent::NoChange(text)
            | UiEvent::RefreshStarted(text)
            | UiEvent::RefreshCompleted(text) => text,
        }
    }

    /// Short tag naming the variant.
    pub fn label(&self) -> &'static str {
        match self {
            UiEvent::ShowMessage(_) => "message",
            UiEvent::Error(_) => "error",
            UiEvent::NoChange(_) => "no-change",
            UiEvent::RefreshStarted(_) => "refresh-started",
            UiEvent::RefreshCompleted(_) => "refresh-completed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(error_message(ErrorKind::Unauthorized), "Unauthorized request");
        assert_eq!(error_message(ErrorKind::Timeout), "Request timed out!");
        assert_eq!(
            error_message(ErrorKind::NoConnectivity),
            "Network issue occurred. Check your connection."
        );
        assert_eq!(error_message(ErrorKind::Unknown), "Something went wrong.");
    }

    #[test]
    fn test_event_defaults() {
        assert_eq!(UiEvent::no_change().text(), "No change in data!");
        assert_eq!(UiEvent::refresh_started().text(), "Refresh started!");
        assert_eq!(UiEvent::refresh_completed().label(), "refresh-completed");
    }

    #[test]
    fn test_initial_state_is_empty() {
        assert_eq!(UiState::default(), UiState::Empty);
    }
}
