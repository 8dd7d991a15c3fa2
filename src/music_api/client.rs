//! HTTP client for the private music-service API.

use super::models::*;
use super::{MusicApiError, MusicService};
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use std::time::Duration;

pub struct HttpMusicService {
    client: reqwest::Client,
    base_url: String,
}

impl HttpMusicService {
    /// # Arguments
    /// * `base_url` - Base URL of the music service API
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

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        auth: &MusicAuth,
        endpoint: String,
    ) -> Result<T, MusicApiError> {
        let url = format!("{}{}", self.base_url, endpoint);
        let response = self
            .client
            .get(&url)
            .header(AUTHORIZATION, &auth.authorization)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(MusicApiError::CredentialsMissing);
        }
        if !status.is_success() {
            return Err(MusicApiError::Status {
                status: status.as_u16(),
                endpoint,
            });
        }

        response
            .json()
            .await
            .map_err(|err| MusicApiError::Malformed(format!("{} ({})", err, endpoint)))
    }
}

#[async_trait]
impl MusicService for HttpMusicService {
    async fn library_artists(
        &self,
        auth: &MusicAuth,
    ) -> Result<Vec<LibraryArtistRef>, MusicApiError> {
        self.get_json(auth, "/library/artists".to_string()).await
    }

    async fn artist_page(
        &self,
        auth: &MusicAuth,
        channel_id: &str,
    ) -> Result<ArtistPage, MusicApiError> {
        self.get_json(auth, format!("/artist/{}", channel_id)).await
    }

    async fn artist_releases(
        &self,
        auth: &MusicAuth,
        channel_id: &str,
        params: &str,
    ) -> Result<Vec<ReleaseSummary>, MusicApiError> {
        self.get_json(
            auth,
            format!(
                "/artist/{}/releases?params={}",
                channel_id,
                urlencoding::encode(params)
            ),
        )
        .await
    }

    async fn album_page(
        &self,
        auth: &MusicAuth,
        browse_id: &str,
    ) -> Result<AlbumPage, MusicApiError> {
        self.get_json(auth, format!("/album/{}", browse_id)).await
    }

    async fn song_details(
        &self,
        auth: &MusicAuth,
        video_id: &str,
    ) -> Result<SongDetails, MusicApiError> {
        self.get_json(auth, format!("/song/{}", video_id)).await
    }
}
