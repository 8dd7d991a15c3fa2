//! Test fixture creation: user database seeding and canned upstream services
//!
//! The mock music service mirrors the shape of the real one closely enough
//! for the sync engine: two artists, three releases, per-song details. Every
//! mock counts its upstream calls so tests can assert that latched entities
//! cause zero network work.

use super::constants::*;
use anyhow::Result;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;
use ytm_mirror_server::downloads::{ExtractorError, VideoExtractor, VideoMetadata};
use ytm_mirror_server::music_api::{
    AlbumPage, ArtistPage, LibraryArtistRef, MusicApiError, MusicAuth, MusicService, ReleaseShelf,
    ReleaseSummary, SongDetails, TrackSummary,
};
use ytm_mirror_server::user::{
    SqliteUserStore, UserAuthCredentials, UserAuthCredentialsStore, UserStore,
    UsernamePasswordCredentials,
};

/// Creates a temporary test database with the two test users
pub fn create_test_db_with_users() -> Result<(TempDir, PathBuf)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("users.db");

    {
        let store = SqliteUserStore::new(&db_path)?;
        create_user_with_password(&store, TEST_USER, TEST_PASS)?;
        create_user_with_password(&store, OTHER_USER, OTHER_PASS)?;
    }

    Ok((temp_dir, db_path))
}

/// Creates a user with the given password credentials
pub fn create_user_with_password(
    store: &SqliteUserStore,
    username: &str,
    password: &str,
) -> Result<usize> {
    let user_id = store.create_user(username)?;

    let credentials = UserAuthCredentials {
        user_id,
        username_password: Some(UsernamePasswordCredentials::from_password(user_id, password)?),
    };
    store.update_user_auth_credentials(credentials)?;

    Ok(user_id)
}

/// A valid music-service credentials file body
pub fn music_auth_file_body() -> &'static [u8] {
    br#"{"access_token": "test-access-token", "token_type": "Bearer"}"#
}

fn release(browse_id: &str, title: &str) -> ReleaseSummary {
    ReleaseSummary {
        browse_id: browse_id.to_string(),
        title: title.to_string(),
        kind: None,
        year: Some(2021),
    }
}

fn track(video_id: &str, number: i64) -> TrackSummary {
    TrackSummary {
        video_id: video_id.to_string(),
        title: format!("Song {}", video_id),
        duration_secs: Some(180),
        disc_number: Some(1),
        track_number: Some(number),
    }
}

fn album_page(browse_id: &str, title: &str, kind: &str, video_ids: &[&str]) -> AlbumPage {
    AlbumPage {
        browse_id: browse_id.to_string(),
        title: title.to_string(),
        kind: Some(kind.to_string()),
        year: Some(2021),
        track_count: Some(video_ids.len() as i64),
        tracks: video_ids
            .iter()
            .enumerate()
            .map(|(i, vid)| track(vid, i as i64 + 1))
            .collect(),
    }
}

/// Canned music service with the standard two-artist upstream catalog
pub struct MockMusicService {
    calls: AtomicUsize,
}

impl MockMusicService {
    pub fn new() -> Self {
        MockMusicService {
            calls: AtomicUsize::new(0),
        }
    }

    /// Total number of upstream calls made so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn count(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl MusicService for MockMusicService {
    async fn library_artists(
        &self,
        _auth: &MusicAuth,
    ) -> Result<Vec<LibraryArtistRef>, MusicApiError> {
        self.count();
        Ok(vec![
            LibraryArtistRef {
                channel_id: ARTIST_1_CHANNEL_ID.to_string(),
                name: ARTIST_1_NAME.to_string(),
            },
            LibraryArtistRef {
                channel_id: ARTIST_2_CHANNEL_ID.to_string(),
                name: ARTIST_2_NAME.to_string(),
            },
        ])
    }

    async fn artist_page(
        &self,
        _auth: &MusicAuth,
        channel_id: &str,
    ) -> Result<ArtistPage, MusicApiError> {
        self.count();
        match channel_id {
            ARTIST_1_CHANNEL_ID => Ok(ArtistPage {
                channel_id: ARTIST_1_CHANNEL_ID.to_string(),
                name: ARTIST_1_NAME.to_string(),
                description: Some("A band that exists for testing".to_string()),
                albums: Some(ReleaseShelf {
                    params: Some(ARTIST_1_ALBUMS_PARAMS.to_string()),
                    results: vec![release(ALBUM_1_BROWSE_ID, ALBUM_1_TITLE)],
                }),
                singles: Some(ReleaseShelf {
                    params: None,
                    results: vec![release(ALBUM_2_BROWSE_ID, ALBUM_2_TITLE)],
                }),
            }),
            ARTIST_2_CHANNEL_ID => Ok(ArtistPage {
                channel_id: ARTIST_2_CHANNEL_ID.to_string(),
                name: ARTIST_2_NAME.to_string(),
                description: None,
                albums: Some(ReleaseShelf {
                    params: None,
                    results: vec![release(ALBUM_3_BROWSE_ID, ALBUM_3_TITLE)],
                }),
                singles: None,
            }),
            other => Err(MusicApiError::Status {
                status: 404,
                endpoint: format!("/artist/{}", other),
            }),
        }
    }

    async fn artist_releases(
        &self,
        _auth: &MusicAuth,
        channel_id: &str,
        params: &str,
    ) -> Result<Vec<ReleaseSummary>, MusicApiError> {
        self.count();
        if channel_id == ARTIST_1_CHANNEL_ID && params == ARTIST_1_ALBUMS_PARAMS {
            Ok(vec![release(ALBUM_1_BROWSE_ID, ALBUM_1_TITLE)])
        } else {
            Ok(vec![])
        }
    }

    async fn album_page(
        &self,
        _auth: &MusicAuth,
        browse_id: &str,
    ) -> Result<AlbumPage, MusicApiError> {
        self.count();
        match browse_id {
            ALBUM_1_BROWSE_ID => Ok(album_page(
                ALBUM_1_BROWSE_ID,
                ALBUM_1_TITLE,
                "ALBUM",
                &[SONG_1_VIDEO_ID, SONG_2_VIDEO_ID],
            )),
            ALBUM_2_BROWSE_ID => Ok(album_page(
                ALBUM_2_BROWSE_ID,
                ALBUM_2_TITLE,
                "SINGLE",
                &[SONG_3_VIDEO_ID],
            )),
            ALBUM_3_BROWSE_ID => Ok(album_page(
                ALBUM_3_BROWSE_ID,
                ALBUM_3_TITLE,
                "ALBUM",
                &[SONG_4_VIDEO_ID],
            )),
            other => Err(MusicApiError::Status {
                status: 404,
                endpoint: format!("/album/{}", other),
            }),
        }
    }

    async fn song_details(
        &self,
        _auth: &MusicAuth,
        video_id: &str,
    ) -> Result<SongDetails, MusicApiError> {
        self.count();
        Ok(SongDetails {
            video_id: video_id.to_string(),
            title: format!("Song {}", video_id),
            duration_secs: Some(180),
            url: Some(format!("https://media.example/{}", video_id)),
        })
    }
}

/// Canned video extractor; URLs containing "broken" fail
pub struct MockVideoExtractor {
    calls: AtomicUsize,
}

impl MockVideoExtractor {
    pub fn new() -> Self {
        MockVideoExtractor {
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VideoExtractor for MockVideoExtractor {
    async fn extract(&self, url: &str) -> Result<VideoMetadata, ExtractorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if url.contains("broken") {
            return Err(ExtractorError::Status(500));
        }
        Ok(VideoMetadata {
            url: url.to_string(),
            title: Some("A Video".to_string()),
            author: Some("Uploader".to_string()),
            author_url: Some("https://videos.example/uploader".to_string()),
            playlist: None,
            description: Some("A test video".to_string()),
        })
    }
}
