//! DTO to domain mapping.

use super::dto::NewsSourceDto;
use crate::types::NewsSource;

impl From<NewsSourceDto> for NewsSource {
    fn from(dto: NewsSourceDto) -> Self {
        NewsSource {
            id: dto.id,
            name: dto.name,
            description: dto.description,
            url: dto.url,
        }
    }
}

/// Map a list of DTOs, preserving order.
pub fn to_domain_list(sources: Vec<NewsSourceDto>) -> Vec<NewsSource> {
    sources.into_iter().map(NewsSource::from).collect()
}
