//! Wire shapes of the sources endpoint.

use serde::{Deserialize, Serialize};

/// Body of `GET top-headlines/sources`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourcesResponseDto {
    /// `"ok"` or `"error"`.
    pub status: String,
    /// Listed sources; absent is treated as empty.
    #[serde(default)]
    pub sources: Vec<NewsSourceDto>,
}

/// One source as sent by the API. Unknown fields (category, language, country) are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsSourceDto {
    /// Identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Short description.
    #[serde(default)]
    pub description: String,
    /// Homepage.
    #[serde(default)]
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_ignores_extra_fields() {
        let json = r#"{
            "status": "ok",
            "sources": [{
                "id": "abc-news",
                "name": "ABC News",
                "description": "Your trusted source",
                "url": "https://abcnews.go.com",
                "category": "general",
                "language": "en",
                "country": "us"
            }]
        }"#;
        let dto: SourcesResponseDto = serde_json::from_str(json).unwrap();
        assert_eq!(dto.status, "ok");
        assert_eq!(dto.sources[0].name, "ABC News");
    }

    #[test]
    fn test_decode_missing_sources() {
        let dto: SourcesResponseDto = serde_json::from_str(r#"{"status":"ok"}"#).unwrap();
        assert!(dto.sources.is_empty());
    }
}
