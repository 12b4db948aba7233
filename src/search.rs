use serde_json::Value;
use tracing::{info, warn};

use crate::config::SearchConfig;
use crate::errors::SearcherError;
use crate::store::{ResponseStore, StoredResponse};
use crate::youtube::{is_valid_response, song_query, YouTubeClient};

/// Result of one search: the raw response and, if it was kept, where it went.
#[derive(Debug)]
pub struct SearchOutcome {
    pub response: Value,
    pub valid: bool,
    pub stored: Option<StoredResponse>,
}

/// Runs searches and persists their responses according to a [`SearchConfig`].
pub struct Searcher {
    client: YouTubeClient,
    store: ResponseStore,
    config: SearchConfig,
}

impl Searcher {
    /// Resolve the API key and open the output directory. Fails if no key is available.
    pub fn new(config: SearchConfig) -> Result<Self, SearcherError> {
        config.validate()?;
        let api_key = config.api_key_source.resolve()?;
        let client = YouTubeClient::new(api_key)?;
        Self::with_client(config, client)
    }

    pub fn with_client(config: SearchConfig, client: YouTubeClient) -> Result<Self, SearcherError> {
        let store = ResponseStore::new(&config.output_dir)?;
        Ok(Self {
            client,
            store,
            config,
        })
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub async fn search_by_query(&self, query: &str) -> Result<SearchOutcome, SearcherError> {
        self.search_with_limit(query, self.config.max_results).await
    }

    pub async fn search_with_limit(
        &self,
        query: &str,
        max_results: u32,
    ) -> Result<SearchOutcome, SearcherError> {
        let response = self.client.search(query, max_results).await?;
        let valid = is_valid_response(&response);

        let stored = if valid || self.config.write_always {
            let stored = self
                .store
                .persist(query, max_results, &response, valid)?;
            Some(stored)
        } else {
            warn!(
                query,
                kind = response["kind"].as_str().unwrap_or("<missing>"),
                "response failed kind check, not persisted"
            );
            None
        };

        Ok(SearchOutcome {
            response,
            valid,
            stored,
        })
    }

    /// Search for "<title> <expansion>", lowercased.
    pub async fn search_by_song(
        &self,
        title: &str,
        expansion: &str,
    ) -> Result<SearchOutcome, SearcherError> {
        let query = song_query(title, expansion);
        info!(title, expansion, query = %query, "song search");
        self.search_by_query(&query).await
    }
}
