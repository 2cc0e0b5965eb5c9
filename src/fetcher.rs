use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::warn;

use crate::{config::FetcherConfig, schedule::Chapter};

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum FetchError {
    #[error("request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error("the response contained no text")]
    EmptyResponse,
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Somewhere chapter text can be retrieved from.
#[async_trait]
pub trait ChapterSource: Send + Sync {
    async fn fetch_chapter(&self, book: &str, chapter: &Chapter) -> Result<String, FetchError>;
}

/// Chapter text as shown to the reader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChapterText {
    Fetched(String),
    /// Placeholder describing why the text could not be retrieved
    Fallback(String),
}

impl ChapterText {
    pub fn as_str(&self) -> &str {
        match self {
            ChapterText::Fetched(text) | ChapterText::Fallback(text) => text,
        }
    }
}

/// Retrieves chapters with a bounded wait, substituting a placeholder on failure.
#[derive(Clone)]
pub struct ContentFetcher {
    source: Arc<dyn ChapterSource>,
    timeout: Duration,
}

impl ContentFetcher {
    pub fn new(source: Arc<dyn ChapterSource>, timeout: Duration) -> Self {
        Self { source, timeout }
    }

    pub fn from_config(config: &FetcherConfig) -> Self {
        Self::new(
            Arc::new(BibleApiSource::new(
                config.base_url.clone(),
                config.translation.clone(),
            )),
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub async fn fetch(&self, book: &str, chapter: &Chapter) -> ChapterText {
        let result = match tokio::time::timeout(
            self.timeout,
            self.source.fetch_chapter(book, chapter),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout(self.timeout)),
        };
        match result {
            Ok(text) => ChapterText::Fetched(text),
            Err(e) => {
                warn!("fetch {} {} failed: {}", book, chapter, e);
                ChapterText::Fallback(format!(
                    "The text of {book} {chapter} could not be loaded right now ({e}). Please try again later."
                ))
            }
        }
    }
}

/// Client for a bible-api.com style service: `GET {base}/{book}+{chapter}`.
#[derive(Debug, Clone)]
pub struct BibleApiSource {
    client: Client,
    base_url: String,
    translation: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PassageResponse {
    text: Option<String>,
}

impl BibleApiSource {
    pub fn new(base_url: String, translation: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url,
            translation,
        }
    }

    fn passage_url(&self, book: &str, chapter: &Chapter) -> String {
        format!(
            "{}/{}+{}",
            self.base_url.trim_end_matches('/'),
            book.trim(),
            chapter
        )
    }
}

#[async_trait]
impl ChapterSource for BibleApiSource {
    async fn fetch_chapter(&self, book: &str, chapter: &Chapter) -> Result<String, FetchError> {
        let mut request = self.client.get(self.passage_url(book, chapter));
        if let Some(translation) = &self.translation {
            request = request.query(&[("translation", translation)]);
        }
        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(FetchError::HttpStatus(response.status()));
        }
        let body: PassageResponse = response.json().await?;
        body.text
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or(FetchError::EmptyResponse)
    }
}
