//! Models for the mirrored library.
//!
//! External ids (channel id, browse id, video id) are the dedup keys; rows
//! are addressed by them everywhere outside the store.

use serde::{Deserialize, Serialize};

/// Release type as reported by the upstream service.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum AlbumKind {
    Album,
    Single,
    Ep,
    Compilation,
}

impl AlbumKind {
    /// Convert from database string representation
    pub fn from_db_str(s: &str) -> Self {
        match s {
            "ALBUM" => AlbumKind::Album,
            "SINGLE" => AlbumKind::Single,
            "EP" => AlbumKind::Ep,
            "COMPILATION" => AlbumKind::Compilation,
            _ => AlbumKind::Album, // Default fallback
        }
    }

    /// Convert to database string representation
    pub fn to_db_str(&self) -> &'static str {
        match self {
            AlbumKind::Album => "ALBUM",
            AlbumKind::Single => "SINGLE",
            AlbumKind::Ep => "EP",
            AlbumKind::Compilation => "COMPILATION",
        }
    }
}

/// Role of an artist on a song.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum SongRole {
    Primary,
    Featured,
}

impl SongRole {
    pub fn from_db_int(value: i32) -> Self {
        match value {
            1 => SongRole::Featured,
            _ => SongRole::Primary,
        }
    }

    pub fn to_db_int(&self) -> i32 {
        match self {
            SongRole::Primary => 0,
            SongRole::Featured => 1,
        }
    }
}

/// Artist entity.
///
/// `albums_params` / `singles_params` are the opaque pagination tokens cached
/// from the artist summary page. `needs_discography` is a one-way latch: it
/// starts true and is cleared after the first complete discography pass.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Artist {
    pub channel_id: String,
    pub name: String,
    pub bio: Option<String>,
    pub albums_params: Option<String>,
    pub singles_params: Option<String>,
    pub needs_discography: bool,
}

impl Artist {
    pub fn new<S: Into<String>, N: Into<String>>(channel_id: S, name: N) -> Self {
        Artist {
            channel_id: channel_id.into(),
            name: name.into(),
            bio: None,
            albums_params: None,
            singles_params: None,
            needs_discography: true,
        }
    }
}

/// Album entity. `needs_tracks` is the per-album latch for the track sync.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Album {
    pub browse_id: String,
    pub title: String,
    pub kind: AlbumKind,
    pub year: Option<i32>,
    pub track_count: Option<i64>,
    pub needs_tracks: bool,
}

/// Song entity.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Song {
    pub video_id: String,
    pub title: String,
    pub duration_secs: Option<i64>,
    pub url: Option<String>,
}

/// A song at its position on an album.
#[derive(Clone, Debug, Serialize)]
pub struct AlbumEntry {
    pub song: Song,
    pub disc_number: i64,
    pub track_number: i64,
}

/// Album with its artists and ordered track list.
#[derive(Clone, Debug, Serialize)]
pub struct ResolvedAlbum {
    pub album: Album,
    pub artists: Vec<Artist>,
    pub entries: Vec<AlbumEntry>,
}

/// Artist with its mirrored discography.
#[derive(Clone, Debug, Serialize)]
pub struct ResolvedArtist {
    pub artist: Artist,
    pub albums: Vec<Album>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn album_kind_roundtrip() {
        let kinds = vec![
            AlbumKind::Album,
            AlbumKind::Single,
            AlbumKind::Ep,
            AlbumKind::Compilation,
        ];
        for kind in kinds {
            assert_eq!(kind, AlbumKind::from_db_str(kind.to_db_str()));
        }
    }

    #[test]
    fn album_kind_unknown_falls_back_to_album() {
        assert_eq!(AlbumKind::from_db_str("MIXTAPE"), AlbumKind::Album);
    }

    #[test]
    fn song_role_roundtrip() {
        for role in [SongRole::Primary, SongRole::Featured] {
            assert_eq!(role, SongRole::from_db_int(role.to_db_int()));
        }
    }

    #[test]
    fn new_artist_needs_discography() {
        let artist = Artist::new("UC123", "Some Band");
        assert!(artist.needs_discography);
        assert!(artist.albums_params.is_none());
    }
}
