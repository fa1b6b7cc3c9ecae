//! # Dictionary
//!
//! Lookup against the public dictionary API (`{base}/{word}`), which answers
//! with an array of candidates. Only the first candidate is used.
use reqwest::{Client, Url};
use thiserror::Error;
use tracing::debug;

use crate::DictionaryData;

pub const DICTIONARY_URL: &str = "https://api.dictionaryapi.dev/api/v2/entries/en";

#[derive(Error, Debug)]
pub enum LookupError {
    #[error("Dictionary request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Dictionary returned status {0}")]
    Status(u16),

    #[error("No dictionary entry for {0:?}")]
    Empty(String),

    #[error("Invalid dictionary url: {0}")]
    InvalidUrl(String),
}

#[derive(Clone)]
pub struct DictionaryClient {
    client: Client,
    base_url: String,
}

impl Default for DictionaryClient {
    fn default() -> Self {
        Self::new(DICTIONARY_URL)
    }
}

impl DictionaryClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// The word becomes a single percent-encoded path segment.
    pub fn url_for(&self, word: &str) -> Result<Url, LookupError> {
        let mut url =
            Url::parse(&self.base_url).map_err(|e| LookupError::InvalidUrl(e.to_string()))?;

        url.path_segments_mut()
            .map_err(|_| LookupError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .push(word.trim());

        Ok(url)
    }

    pub async fn lookup(&self, word: &str) -> Result<DictionaryData, LookupError> {
        let response = self.client.get(self.url_for(word)?).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::Status(status.as_u16()));
        }

        let candidates: Vec<DictionaryData> = response.json().await?;
        debug!("Dictionary returned {} candidates for {word}", candidates.len());

        candidates
            .into_iter()
            .next()
            .ok_or_else(|| LookupError::Empty(word.to_string()))
    }
}
