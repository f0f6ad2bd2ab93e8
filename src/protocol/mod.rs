//! Wire-level constants and header handling.
//!
//! # Key Items
//!
//! | Item | Description |
//! |------|-------------|
//! | [`constants`] | Header names, endpoint paths and cache lifetimes |
//! | [`CacheDirectives`] | Parsed `Cache-Control` directive list |
//! | [`ErrorEnvelope`] | Best-effort `{error?, message?}` error body |
//!
//! # Examples
//!
//! ```
//! use news_sources::protocol::{CacheDirectives, format_cache_control};
//!
//! let directives = CacheDirectives::parse("public, max-age=86400");
//! assert_eq!(directives.max_age, Some(86400));
//! assert!(directives.public);
//!
//! let header = format_cache_control(&CacheDirectives::stale_tolerant(86400, 604800));
//! assert_eq!(header, "max-age=86400, max-stale=604800");
//! ```

mod cache_control;
pub mod constants;

pub use cache_control::{format_cache_control, CacheDirectives};

use serde::Deserialize;

/// Structured error body some origins send with failure statuses.
///
/// Both fields are optional; unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ErrorEnvelope {
    /// Short error text; preferred when present.
    #[serde(default)]
    pub error: Option<String>,
    /// Longer description.
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorEnvelope {
    /// Parse an error body, returning `None` when it is not a JSON object
    /// of the expected shape.
    pub fn parse(body: &str) -> Option<Self> {
        serde_json::from_str(body).ok()
    }

    /// `error` if present, else `message`.
    pub fn resolved_message(&self) -> Option<&str> {
        self.error.as_deref().or(self.message.as_deref())
    }
}
