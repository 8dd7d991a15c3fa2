//! Response models for the private music-service API.
//!
//! Shapes match the JSON the service returns; conversion into library models
//! happens in the sync engine.

use super::MusicApiError;
use crate::library::{Album, AlbumKind};
use serde::Deserialize;
use std::path::Path;

/// Per-user credentials for the music service, loaded from the file the user
/// registered through the setup route.
#[derive(Clone, Debug)]
pub struct MusicAuth {
    pub user_id: usize,
    pub authorization: String,
}

#[derive(Deserialize)]
struct MusicAuthFile {
    access_token: String,
    #[serde(default = "default_token_type")]
    token_type: String,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

impl MusicAuth {
    /// Reads the registered credentials file. Any failure (absent file,
    /// unparseable content) is the missing-credentials case.
    pub fn load<P: AsRef<Path>>(user_id: usize, path: P) -> Result<Self, MusicApiError> {
        let raw = std::fs::read_to_string(path.as_ref())
            .map_err(|_| MusicApiError::CredentialsMissing)?;
        let parsed: MusicAuthFile =
            serde_json::from_str(&raw).map_err(|_| MusicApiError::CredentialsMissing)?;
        Ok(MusicAuth {
            user_id,
            authorization: format!("{} {}", parsed.token_type, parsed.access_token),
        })
    }
}

/// One entry of the subscribed-artist list.
#[derive(Clone, Debug, Deserialize)]
pub struct LibraryArtistRef {
    pub channel_id: String,
    pub name: String,
}

/// A release as it appears in a shelf or listing: enough to get-or-create
/// the album row, not the full detail.
#[derive(Clone, Debug, Deserialize)]
pub struct ReleaseSummary {
    pub browse_id: String,
    pub title: String,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
}

impl ReleaseSummary {
    /// Minimal album row for the get-or-create step; the full detail fetch
    /// on creation overwrites these fields.
    pub fn to_album_stub(&self, fallback_kind: AlbumKind) -> Album {
        Album {
            browse_id: self.browse_id.clone(),
            title: self.title.clone(),
            kind: self
                .kind
                .as_deref()
                .map(AlbumKind::from_db_str)
                .unwrap_or(fallback_kind),
            year: self.year,
            track_count: None,
            needs_tracks: true,
        }
    }
}

/// A shelf on the artist summary page: the embedded first page of results
/// plus the opaque params token for the paginated listing endpoint.
#[derive(Clone, Debug, Deserialize)]
pub struct ReleaseShelf {
    #[serde(default)]
    pub params: Option<String>,
    #[serde(default)]
    pub results: Vec<ReleaseSummary>,
}

/// Artist summary page.
#[derive(Clone, Debug, Deserialize)]
pub struct ArtistPage {
    pub channel_id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub albums: Option<ReleaseShelf>,
    #[serde(default)]
    pub singles: Option<ReleaseShelf>,
}

/// A track as listed on an album page.
#[derive(Clone, Debug, Deserialize)]
pub struct TrackSummary {
    pub video_id: String,
    pub title: String,
    #[serde(default)]
    pub duration_secs: Option<i64>,
    #[serde(default)]
    pub disc_number: Option<i64>,
    #[serde(default)]
    pub track_number: Option<i64>,
}

/// Full album detail.
#[derive(Clone, Debug, Deserialize)]
pub struct AlbumPage {
    pub browse_id: String,
    pub title: String,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub track_count: Option<i64>,
    #[serde(default)]
    pub tracks: Vec<TrackSummary>,
}

impl AlbumPage {
    pub fn to_album(&self, fallback_kind: AlbumKind) -> Album {
        Album {
            browse_id: self.browse_id.clone(),
            title: self.title.clone(),
            kind: self
                .kind
                .as_deref()
                .map(AlbumKind::from_db_str)
                .unwrap_or(fallback_kind),
            year: self.year,
            track_count: self.track_count.or(Some(self.tracks.len() as i64)),
            needs_tracks: true,
        }
    }
}

/// Per-song detail.
#[derive(Clone, Debug, Deserialize)]
pub struct SongDetails {
    pub video_id: String,
    pub title: String,
    #[serde(default)]
    pub duration_secs: Option<i64>,
    #[serde(default)]
    pub url: Option<String>,
}
