#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

pub mod cache;
pub mod client;
pub mod data;
pub mod error;
pub mod protocol;
pub mod scope;
pub mod types;
pub mod ui;

pub use client::{ClientConfig, NewsApiClient};
pub use error::{NewsError, Result};
pub use types::{ApiResponse, ErrorKind, NewsSource, Resource};
pub use ui::{NewsSourcesViewModel, UiEvent, UiState};
