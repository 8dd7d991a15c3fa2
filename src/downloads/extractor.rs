//! Client for the external video-extraction service (metadata-only mode).

use super::models::VideoMetadata;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractorError {
    #[error("extractor request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("extractor returned status {0}")]
    Status(u16),

    #[error("unexpected extractor response: {0}")]
    Malformed(String),
}

#[async_trait]
pub trait VideoExtractor: Send + Sync {
    /// Fetch metadata for a video URL without downloading any media.
    async fn extract(&self, url: &str) -> Result<VideoMetadata, ExtractorError>;
}

pub struct HttpExtractorClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpExtractorClient {
    /// # Arguments
    /// * `base_url` - Base URL of the extractor service
    /// * `timeout_sec` - Request timeout in seconds
    pub fn new(base_url: String, timeout_sec: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_sec))
            .build()
            .expect("Failed to create HTTP client");

        let base_url = base_url.trim_end_matches('/').to_string();

        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl VideoExtractor for HttpExtractorClient {
    async fn extract(&self, url: &str) -> Result<VideoMetadata, ExtractorError> {
        let endpoint = format!(
            "{}/extract?url={}",
            self.base_url,
            urlencoding::encode(url)
        );
        let response = self.client.get(&endpoint).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExtractorError::Status(status.as_u16()));
        }

        response
            .json()
            .await
            .map_err(|err| ExtractorError::Malformed(err.to_string()))
    }
}
