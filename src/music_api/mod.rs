mod client;
pub mod models;

pub use client::HttpMusicService;
pub use models::{
    AlbumPage, ArtistPage, LibraryArtistRef, MusicAuth, ReleaseShelf, ReleaseSummary, SongDetails,
    TrackSummary,
};

use async_trait::async_trait;
use thiserror::Error;

/// Default base URL of the private music-service API.
pub const DEFAULT_MUSIC_API_URL: &str = "https://music.youtube.com/youtubei/v1";

#[derive(Debug, Error)]
pub enum MusicApiError {
    /// The caller has no registered credentials file, or it is unreadable.
    /// The request boundary turns this into a pointer at the setup route.
    #[error("music service credentials are not configured")]
    CredentialsMissing,

    #[error("music service request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("music service returned status {status} for {endpoint}")]
    Status { status: u16, endpoint: String },

    #[error("unexpected music service response: {0}")]
    Malformed(String),
}

/// Client for the private music-streaming API.
///
/// One method per upstream endpoint the sync walks; implementations do no
/// retrying, callers see every failure.
#[async_trait]
pub trait MusicService: Send + Sync {
    /// The user's subscribed-artist list.
    async fn library_artists(&self, auth: &MusicAuth)
        -> Result<Vec<LibraryArtistRef>, MusicApiError>;

    /// Artist summary page, including the embedded first-page album/single
    /// shelves and their pagination tokens.
    async fn artist_page(
        &self,
        auth: &MusicAuth,
        channel_id: &str,
    ) -> Result<ArtistPage, MusicApiError>;

    /// Paginated release listing for one shelf, driven by a cached params
    /// token.
    async fn artist_releases(
        &self,
        auth: &MusicAuth,
        channel_id: &str,
        params: &str,
    ) -> Result<Vec<ReleaseSummary>, MusicApiError>;

    /// Full album detail including the track listing.
    async fn album_page(
        &self,
        auth: &MusicAuth,
        browse_id: &str,
    ) -> Result<AlbumPage, MusicApiError>;

    /// Per-song detail; fetched only for newly created rows.
    async fn song_details(
        &self,
        auth: &MusicAuth,
        video_id: &str,
    ) -> Result<SongDetails, MusicApiError>;
}
