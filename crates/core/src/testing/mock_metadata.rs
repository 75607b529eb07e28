//! Mock metadata provider.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::metadata::{
    MetadataError, MetadataProvider, ShowDetails, TitleMetadata, TrendingItem,
};

/// Controllable [`MetadataProvider`] backed by in-memory maps.
#[derive(Default)]
pub struct MockMetadata {
    titles: Mutex<HashMap<String, TitleMetadata>>,
    details: Mutex<HashMap<String, ShowDetails>>,
    trending: Mutex<Vec<TrendingItem>>,
    imdb_ids: Mutex<HashMap<String, String>>,
}

impl MockMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a movie title for an external id.
    pub fn add_movie(&self, external_id: &str, title: &str, year: &str) {
        self.titles.lock().unwrap().insert(
            external_id.to_string(),
            TitleMetadata {
                title: title.to_string(),
                year: year.to_string(),
                kind: "movie".into(),
                provider_id: format!("tmdb-{external_id}"),
            },
        );
    }

    /// Register a series with its season count.
    pub fn add_series(&self, external_id: &str, title: &str, year: &str, seasons: u32) {
        let provider_id = format!("tmdb-{external_id}");
        self.titles.lock().unwrap().insert(
            external_id.to_string(),
            TitleMetadata {
                title: title.to_string(),
                year: year.to_string(),
                kind: "series".into(),
                provider_id: provider_id.clone(),
            },
        );
        self.details.lock().unwrap().insert(
            provider_id,
            ShowDetails {
                name: title.to_string(),
                year: year.to_string(),
                number_of_seasons: seasons,
            },
        );
    }

    pub fn set_trending(&self, items: Vec<TrendingItem>) {
        *self.trending.lock().unwrap() = items;
    }

    pub fn add_imdb_mapping(&self, provider_id: &str, imdb_id: &str) {
        self.imdb_ids
            .lock()
            .unwrap()
            .insert(provider_id.to_string(), imdb_id.to_string());
    }
}

#[async_trait]
impl MetadataProvider for MockMetadata {
    async fn resolve(&self, external_id: &str) -> Result<TitleMetadata, MetadataError> {
        self.titles
            .lock()
            .unwrap()
            .get(external_id)
            .cloned()
            .ok_or_else(|| MetadataError::NotFound(external_id.to_string()))
    }

    async fn tv_details(&self, provider_id: &str) -> Result<ShowDetails, MetadataError> {
        self.details
            .lock()
            .unwrap()
            .get(provider_id)
            .cloned()
            .ok_or_else(|| MetadataError::NotFound(provider_id.to_string()))
    }

    async fn trending_tv(&self) -> Result<Vec<TrendingItem>, MetadataError> {
        Ok(self.trending.lock().unwrap().clone())
    }

    async fn imdb_id_for(
        &self,
        _media_type: &str,
        provider_id: &str,
    ) -> Result<String, MetadataError> {
        self.imdb_ids
            .lock()
            .unwrap()
            .get(provider_id)
            .cloned()
            .ok_or_else(|| MetadataError::NotFound(provider_id.to_string()))
    }
}
