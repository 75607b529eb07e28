//! Metadata capability set and shared types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Title information resolved from an external id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleMetadata {
    pub title: String,
    /// Release/first-air year as a 4-digit string, empty when unknown.
    pub year: String,
    /// "movie" or "series".
    pub kind: String,
    /// Provider-side id (TMDB id), used for detail lookups.
    pub provider_id: String,
}

/// Detail record for a TV show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShowDetails {
    pub name: String,
    pub year: String,
    pub number_of_seasons: u32,
}

/// One entry of the provider's trending feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrendingItem {
    pub provider_id: String,
    pub title: String,
    /// "movie" or "tv".
    pub media_type: String,
    pub year: String,
}

/// Errors from metadata lookups.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("metadata request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("metadata API key is invalid")]
    InvalidApiKey,

    #[error("metadata rate limit exceeded")]
    RateLimited,

    #[error("metadata API error: status {0}")]
    Api(u16),

    #[error("no results found for {0}")]
    NotFound(String),
}

/// The metadata operations the core depends on.
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Resolve an IMDb-style external id to title metadata.
    async fn resolve(&self, external_id: &str) -> Result<TitleMetadata, MetadataError>;

    /// Fetch show details (season count) by provider id.
    async fn tv_details(&self, provider_id: &str) -> Result<ShowDetails, MetadataError>;

    /// Currently trending TV shows, most popular first.
    async fn trending_tv(&self) -> Result<Vec<TrendingItem>, MetadataError>;

    /// Map a provider id back to an IMDb-style external id.
    async fn imdb_id_for(
        &self,
        media_type: &str,
        provider_id: &str,
    ) -> Result<String, MetadataError>;
}
