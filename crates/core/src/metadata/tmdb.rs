//! TMDB (The Movie Database) metadata backend.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::cache::CacheStore;

use super::{MetadataError, MetadataProvider, ShowDetails, TitleMetadata, TrendingItem};

const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3";
const USER_AGENT: &str = "strembox/0.1";

/// TMDB client configuration.
#[derive(Debug, Clone)]
pub struct TmdbConfig {
    pub api_key: String,
    pub base_url: Option<String>,
    /// TTL for resolved title metadata.
    pub cache_ttl: Duration,
}

impl Default for TmdbConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: None,
            cache_ttl: Duration::from_secs(24 * 60 * 60),
        }
    }
}

/// TMDB metadata provider.
pub struct TmdbProvider {
    client: Client,
    base_url: String,
    api_key: String,
    cache: Option<Arc<CacheStore>>,
    cache_ttl: Duration,
}

#[derive(Debug, Deserialize)]
struct FindResponse {
    #[serde(default)]
    movie_results: Vec<MovieResult>,
    #[serde(default)]
    tv_results: Vec<TvResult>,
}

#[derive(Debug, Deserialize)]
struct MovieResult {
    id: i64,
    #[serde(default)]
    title: String,
    #[serde(default)]
    release_date: String,
}

#[derive(Debug, Deserialize)]
struct TvResult {
    id: i64,
    #[serde(default)]
    name: String,
    #[serde(default)]
    first_air_date: String,
}

#[derive(Debug, Deserialize)]
struct TvDetailsResponse {
    #[serde(default)]
    id: i64,
    #[serde(default)]
    name: String,
    #[serde(default)]
    first_air_date: String,
    #[serde(default)]
    number_of_seasons: u32,
}

#[derive(Debug, Deserialize)]
struct TrendingResponse {
    #[serde(default)]
    results: Vec<TrendingResult>,
}

#[derive(Debug, Deserialize)]
struct TrendingResult {
    id: i64,
    #[serde(default)]
    title: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    media_type: String,
    #[serde(default)]
    release_date: String,
    #[serde(default)]
    first_air_date: String,
}

#[derive(Debug, Deserialize)]
struct ExternalIdsResponse {
    #[serde(default)]
    imdb_id: Option<String>,
}

fn year_of(date: &str) -> String {
    if date.len() >= 4 {
        date[..4].to_string()
    } else {
        String::new()
    }
}

impl TmdbProvider {
    pub fn new(config: TmdbConfig) -> Result<Self, MetadataError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            base_url: config
                .base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_key: config.api_key,
            cache: None,
            cache_ttl: config.cache_ttl,
        })
    }

    /// Attach the shared cache; resolved titles become TTL-cached.
    pub fn with_cache(mut self, cache: Arc<CacheStore>) -> Self {
        self.cache = Some(cache);
        self
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, MetadataError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str()), ("language", "en-US")])
            .query(query)
            .header("User-Agent", USER_AGENT)
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if status == 401 {
            return Err(MetadataError::InvalidApiKey);
        }
        if status == 429 {
            return Err(MetadataError::RateLimited);
        }
        if !status.is_success() {
            return Err(MetadataError::Api(status.as_u16()));
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl MetadataProvider for TmdbProvider {
    async fn resolve(&self, external_id: &str) -> Result<TitleMetadata, MetadataError> {
        if !external_id.starts_with("tt") || external_id.len() < 4 {
            return Err(MetadataError::NotFound(external_id.to_string()));
        }

        let cache_key = format!("meta_{external_id}");
        if let Some(cache) = &self.cache {
            if let Some(cached) = cache.get_as::<TitleMetadata>(&cache_key).await {
                debug!(external_id, title = %cached.title, "metadata served from cache");
                return Ok(cached);
            }
        }

        debug!(external_id, "resolving title via TMDB");
        let found: FindResponse = self
            .get_json(
                &format!("/find/{}", urlencoding::encode(external_id)),
                &[("external_source", "imdb_id")],
            )
            .await?;

        let metadata = if let Some(movie) = found.movie_results.first() {
            TitleMetadata {
                title: movie.title.clone(),
                year: year_of(&movie.release_date),
                kind: "movie".into(),
                provider_id: movie.id.to_string(),
            }
        } else if let Some(show) = found.tv_results.first() {
            TitleMetadata {
                title: show.name.clone(),
                year: year_of(&show.first_air_date),
                kind: "series".into(),
                provider_id: show.id.to_string(),
            }
        } else {
            return Err(MetadataError::NotFound(external_id.to_string()));
        };

        if let Some(cache) = &self.cache {
            cache.set_as(&cache_key, &metadata, self.cache_ttl).await;
        }

        Ok(metadata)
    }

    async fn tv_details(&self, provider_id: &str) -> Result<ShowDetails, MetadataError> {
        let details: TvDetailsResponse = self
            .get_json(&format!("/tv/{}", urlencoding::encode(provider_id)), &[])
            .await?;

        if details.id == 0 {
            warn!(provider_id, "TMDB returned no show details");
            return Err(MetadataError::NotFound(provider_id.to_string()));
        }

        Ok(ShowDetails {
            name: details.name,
            year: year_of(&details.first_air_date),
            number_of_seasons: details.number_of_seasons,
        })
    }

    async fn trending_tv(&self) -> Result<Vec<TrendingItem>, MetadataError> {
        let trending: TrendingResponse = self.get_json("/trending/tv/week", &[]).await?;

        debug!(count = trending.results.len(), "fetched trending TV shows");

        Ok(trending
            .results
            .into_iter()
            .map(|item| {
                let title = if item.name.is_empty() {
                    item.title
                } else {
                    item.name
                };
                let year = if item.first_air_date.is_empty() {
                    year_of(&item.release_date)
                } else {
                    year_of(&item.first_air_date)
                };
                TrendingItem {
                    provider_id: item.id.to_string(),
                    title,
                    media_type: if item.media_type.is_empty() {
                        "tv".into()
                    } else {
                        item.media_type
                    },
                    year,
                }
            })
            .collect())
    }

    async fn imdb_id_for(
        &self,
        media_type: &str,
        provider_id: &str,
    ) -> Result<String, MetadataError> {
        let external: ExternalIdsResponse = self
            .get_json(
                &format!(
                    "/{}/{}/external_ids",
                    urlencoding::encode(media_type),
                    urlencoding::encode(provider_id)
                ),
                &[],
            )
            .await?;

        external
            .imdb_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| MetadataError::NotFound(provider_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_year_extraction() {
        assert_eq!(year_of("2008-01-20"), "2008");
        assert_eq!(year_of("2008"), "2008");
        assert_eq!(year_of(""), "");
        assert_eq!(year_of("20"), "");
    }

    #[tokio::test]
    async fn test_resolve_rejects_malformed_ids() {
        let provider = TmdbProvider::new(TmdbConfig::default()).unwrap();
        assert!(matches!(
            provider.resolve("0111161").await,
            Err(MetadataError::NotFound(_))
        ));
        assert!(matches!(
            provider.resolve("tt").await,
            Err(MetadataError::NotFound(_))
        ));
    }
}
