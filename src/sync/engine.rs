//! Library mirror sync.
//!
//! Walks the upstream subscribed-artist list, the per-artist discography and
//! the per-album track listing, materializing each entity in the library
//! store exactly once (get-or-create keyed by external id). The
//! `needs_discography` / `needs_tracks` latches make a completed pass
//! permanent: once cleared, re-invoking the sync performs zero upstream
//! calls for that entity.
//!
//! Runs synchronously inside the request handler. There is no retry and no
//! transaction spanning a pass; an upstream failure aborts the operation and
//! whatever rows were created before it are kept.

use crate::library::{AlbumKind, Artist, LibraryStore, SongRole};
use crate::music_api::{ArtistPage, MusicApiError, MusicAuth, MusicService, ReleaseSummary};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Api(#[from] MusicApiError),

    #[error("artist {0} is not in the library")]
    UnknownArtist(String),

    #[error("album {0} is not in the library")]
    UnknownAlbum(String),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

/// Counters accumulated over one sync operation, returned to the caller.
#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct SyncReport {
    pub artists_seen: usize,
    pub artists_created: usize,
    pub albums_created: usize,
    pub songs_created: usize,
}

impl SyncReport {
    fn absorb(&mut self, other: SyncReport) {
        self.artists_seen += other.artists_seen;
        self.artists_created += other.artists_created;
        self.albums_created += other.albums_created;
        self.songs_created += other.songs_created;
    }
}

pub struct SyncEngine {
    store: Arc<dyn LibraryStore>,
    service: Arc<dyn MusicService>,
}

impl SyncEngine {
    pub fn new(store: Arc<dyn LibraryStore>, service: Arc<dyn MusicService>) -> Self {
        SyncEngine { store, service }
    }

    /// Mirror the whole subscribed-artist list: upsert every artist, then run
    /// the discography sync for each, re-using the summary page that the
    /// upsert already fetched.
    pub async fn sync_library(&self, auth: &MusicAuth) -> Result<SyncReport, SyncError> {
        let subscriptions = self.service.library_artists(auth).await?;
        info!("Library sync: {} subscribed artists", subscriptions.len());

        let mut report = SyncReport::default();
        for subscription in subscriptions {
            let artist_report = self.sync_artist(auth, &subscription.channel_id).await?;
            report.absorb(artist_report);
        }

        info!(
            "Library sync done: {} artists ({} new), {} albums created, {} songs created",
            report.artists_seen, report.artists_created, report.albums_created, report.songs_created
        );
        Ok(report)
    }

    /// Fetch one artist's summary page, persist or update the artist row
    /// idempotently, then sync its discography.
    pub async fn sync_artist(
        &self,
        auth: &MusicAuth,
        channel_id: &str,
    ) -> Result<SyncReport, SyncError> {
        let page = self.service.artist_page(auth, channel_id).await?;

        let mut artist = Artist::new(page.channel_id.clone(), page.name.clone());
        artist.bio = page.description.clone();
        artist.albums_params = page.albums.as_ref().and_then(|s| s.params.clone());
        artist.singles_params = page.singles.as_ref().and_then(|s| s.params.clone());
        let created = self.store.upsert_artist(&artist)?;

        let mut report = SyncReport {
            artists_seen: 1,
            artists_created: usize::from(created),
            ..SyncReport::default()
        };
        report.albums_created = self
            .sync_discography_inner(auth, channel_id, Some(&page))
            .await?;
        Ok(report)
    }

    /// Discography sync for an artist already in the library.
    ///
    /// Returns with zero upstream calls when the per-artist latch is already
    /// cleared.
    pub async fn sync_discography(
        &self,
        auth: &MusicAuth,
        channel_id: &str,
    ) -> Result<usize, SyncError> {
        self.sync_discography_inner(auth, channel_id, None).await
    }

    async fn sync_discography_inner(
        &self,
        auth: &MusicAuth,
        channel_id: &str,
        prefetched_page: Option<&ArtistPage>,
    ) -> Result<usize, SyncError> {
        let artist = self
            .store
            .get_artist(channel_id)?
            .ok_or_else(|| SyncError::UnknownArtist(channel_id.to_string()))?;

        if !artist.needs_discography {
            debug!("Discography of {} already synced, skipping", channel_id);
            return Ok(0);
        }

        // Shelves with a cached params token go straight to the listing
        // endpoint; the rest fall back to the embedded first-page results of
        // the summary page, fetched at most once.
        let mut fallback_page: Option<ArtistPage> = None;
        let mut candidates: Vec<(ReleaseSummary, AlbumKind)> = Vec::new();

        for (params, fallback_kind, shelf) in [
            (artist.albums_params.as_deref(), AlbumKind::Album, ShelfId::Albums),
            (artist.singles_params.as_deref(), AlbumKind::Single, ShelfId::Singles),
        ] {
            let results = match params {
                Some(params) => {
                    self.service
                        .artist_releases(auth, channel_id, params)
                        .await?
                }
                None => {
                    if fallback_page.is_none() && prefetched_page.is_none() {
                        fallback_page = Some(self.service.artist_page(auth, channel_id).await?);
                        let page = fallback_page.as_ref().unwrap();
                        self.store.set_artist_browse_params(
                            channel_id,
                            page.albums.as_ref().and_then(|s| s.params.as_deref()),
                            page.singles.as_ref().and_then(|s| s.params.as_deref()),
                        )?;
                    }
                    let page = prefetched_page.or(fallback_page.as_ref());
                    page.and_then(|p| shelf.pick(p))
                        .map(|s| s.results.clone())
                        .unwrap_or_default()
                }
            };
            candidates.extend(results.into_iter().map(|r| (r, fallback_kind)));
        }

        let mut albums_created = 0;
        for (summary, fallback_kind) in candidates {
            let created = self
                .store
                .create_album_if_missing(&summary.to_album_stub(fallback_kind))?;
            if created {
                // Full detail and the artist link are fetched/written only
                // for rows this pass created.
                let page = self.service.album_page(auth, &summary.browse_id).await?;
                self.store.update_album(&page.to_album(fallback_kind))?;
                self.store.link_album_artist(channel_id, &summary.browse_id)?;
                albums_created += 1;
            }
        }

        self.store.mark_discography_synced(channel_id)?;
        info!(
            "Synced discography of {}: {} albums created",
            channel_id, albums_created
        );
        Ok(albums_created)
    }

    /// Track sync for an album already in the library: same
    /// get-or-create-and-latch pattern one level down.
    pub async fn sync_album_tracks(
        &self,
        auth: &MusicAuth,
        browse_id: &str,
    ) -> Result<usize, SyncError> {
        let album = self
            .store
            .get_album(browse_id)?
            .ok_or_else(|| SyncError::UnknownAlbum(browse_id.to_string()))?;

        if !album.needs_tracks {
            debug!("Tracks of {} already synced, skipping", browse_id);
            return Ok(0);
        }

        let album_artists = self.store.get_album_artists(browse_id)?;
        let page = self.service.album_page(auth, browse_id).await?;

        let mut songs_created = 0;
        for (index, track) in page.tracks.iter().enumerate() {
            let disc_number = track.disc_number.unwrap_or(1);
            let track_number = track.track_number.unwrap_or(index as i64 + 1);

            let created = self.store.create_song_if_missing(&crate::library::Song {
                video_id: track.video_id.clone(),
                title: track.title.clone(),
                duration_secs: track.duration_secs,
                url: None,
            })?;
            if created {
                // Per-song detail only for newly created rows
                let details = self.service.song_details(auth, &track.video_id).await?;
                self.store.update_song(&crate::library::Song {
                    video_id: details.video_id,
                    title: details.title,
                    duration_secs: details.duration_secs.or(track.duration_secs),
                    url: details.url,
                })?;
                for channel_id in &album_artists {
                    self.store
                        .link_song_artist(&track.video_id, channel_id, SongRole::Primary)?;
                }
                songs_created += 1;
            }
            self.store
                .link_album_song(browse_id, &track.video_id, disc_number, track_number)?;
        }

        self.store.mark_album_tracks_synced(browse_id)?;
        info!(
            "Synced tracks of {}: {} songs created",
            browse_id, songs_created
        );
        Ok(songs_created)
    }
}

#[derive(Clone, Copy)]
enum ShelfId {
    Albums,
    Singles,
}

impl ShelfId {
    fn pick<'a>(&self, page: &'a ArtistPage) -> Option<&'a crate::music_api::ReleaseShelf> {
        match self {
            ShelfId::Albums => page.albums.as_ref(),
            ShelfId::Singles => page.singles.as_ref(),
        }
    }
}
