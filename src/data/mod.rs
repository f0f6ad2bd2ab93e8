//! Data layer: wire DTOs, the safe call adapter and the repository.
//!
//! | Item | Description |
//! |------|-------------|
//! | [`safe_api_call`] | Classifies a call's outcome into a [`Resource`](crate::Resource) |
//! | [`RemoteDataSource`] | Seam over the HTTP client |
//! | [`NewsSourcesRepository`] | `Loading` then one terminal value per fetch |
//! | [`GetNewsSourcesUseCase`] | What the view model calls |

pub mod dto;
mod mapper;
mod remote;
mod repository;
mod safe_call;
mod use_case;

pub use mapper::to_domain_list;
pub use remote::RemoteDataSource;
pub use repository::{DefaultNewsSourcesRepository, NewsSourcesRepository, SourcesStream};
pub use safe_call::{safe_api_call, Cancelled, EMPTY_BODY_MESSAGE};
pub use use_case::{DefaultGetNewsSourcesUseCase, GetNewsSourcesUseCase};
