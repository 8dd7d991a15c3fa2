//! LibraryStore trait definition.

use super::models::{Album, AlbumEntry, Artist, ResolvedAlbum, ResolvedArtist, Song, SongRole};
use anyhow::Result;

/// Storage backend for the mirrored library.
///
/// All get-or-create operations are keyed by the upstream external id and
/// must never create a second row for an id that already exists, including
/// under concurrent callers (the UNIQUE constraints are the last line of
/// defense).
pub trait LibraryStore: Send + Sync {
    // =========================================================================
    // Artists
    // =========================================================================

    fn get_artist(&self, channel_id: &str) -> Result<Option<Artist>>;

    fn list_artists(&self) -> Result<Vec<Artist>>;

    /// Create the artist or idempotently update name/bio/params of an
    /// existing row. The `needs_discography` latch of an existing row is left
    /// untouched. Returns true when a new row was created.
    fn upsert_artist(&self, artist: &Artist) -> Result<bool>;

    /// Cache the pagination tokens read from the artist summary page.
    fn set_artist_browse_params(
        &self,
        channel_id: &str,
        albums_params: Option<&str>,
        singles_params: Option<&str>,
    ) -> Result<()>;

    /// Clear the per-artist latch. One-way: there is no operation to set it
    /// back.
    fn mark_discography_synced(&self, channel_id: &str) -> Result<()>;

    /// Artist with their mirrored discography, or None if unknown.
    fn get_resolved_artist(&self, channel_id: &str) -> Result<Option<ResolvedArtist>>;

    // =========================================================================
    // Albums
    // =========================================================================

    fn get_album(&self, browse_id: &str) -> Result<Option<Album>>;

    /// Insert the album unless a row with this browse id already exists.
    /// Returns true when the row was created by this call.
    fn create_album_if_missing(&self, album: &Album) -> Result<bool>;

    /// Overwrite title/type/year/track count from a full album detail fetch.
    fn update_album(&self, album: &Album) -> Result<()>;

    fn link_album_artist(&self, channel_id: &str, browse_id: &str) -> Result<()>;

    /// Clear the per-album latch.
    fn mark_album_tracks_synced(&self, browse_id: &str) -> Result<()>;

    /// Channel ids of the artists linked to an album, insertion order.
    fn get_album_artists(&self, browse_id: &str) -> Result<Vec<String>>;

    /// Album with artists and entries ordered by (disc, track), or None.
    fn get_resolved_album(&self, browse_id: &str) -> Result<Option<ResolvedAlbum>>;

    // =========================================================================
    // Songs
    // =========================================================================

    fn get_song(&self, video_id: &str) -> Result<Option<Song>>;

    /// Insert the song unless a row with this video id already exists.
    /// Returns true when the row was created by this call.
    fn create_song_if_missing(&self, song: &Song) -> Result<bool>;

    /// Overwrite title/duration/url from a per-song detail fetch.
    fn update_song(&self, song: &Song) -> Result<()>;

    /// Place a song on an album. Idempotent for an identical placement;
    /// a different song in an occupied (disc, track) slot is an error.
    fn link_album_song(
        &self,
        browse_id: &str,
        video_id: &str,
        disc_number: i64,
        track_number: i64,
    ) -> Result<()>;

    fn link_song_artist(&self, video_id: &str, channel_id: &str, role: SongRole) -> Result<()>;

    /// Entries of an album ordered by (disc, track).
    fn get_album_entries(&self, browse_id: &str) -> Result<Vec<AlbumEntry>>;

    // =========================================================================
    // Counts (for metrics)
    // =========================================================================

    fn get_artists_count(&self) -> usize;
    fn get_albums_count(&self) -> usize;
    fn get_songs_count(&self) -> usize;
}
