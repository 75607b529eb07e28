//! Jackett indexer backend.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::{Indexer, IndexerResult, ScrapeError};

const INDEXER_TIMEOUT: Duration = Duration::from_secs(30);

/// Jackett client querying the aggregate `all` indexer.
pub struct JackettClient {
    client: Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct JackettResponse {
    #[serde(rename = "Results", default)]
    results: Vec<IndexerResult>,
}

impl JackettClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(INDEXER_TIMEOUT)
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(30))
            .build()
            .expect("failed to build HTTP client");

        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    fn search_url(&self, query: &str) -> String {
        format!(
            "{}/api/v2.0/indexers/all/results?apikey={}&Query={}",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(&self.api_key),
            urlencoding::encode(query)
        )
    }
}

#[async_trait]
impl Indexer for JackettClient {
    async fn fetch_raw(&self, query: &str) -> Result<Vec<IndexerResult>, ScrapeError> {
        let url = self.search_url(query);
        debug!(query, "querying indexer");

        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::UpstreamStatus(status.as_u16()));
        }

        let body: JackettResponse = response.json().await?;
        debug!(query, results = body.results.len(), "indexer query complete");

        Ok(body.results)
    }
}
