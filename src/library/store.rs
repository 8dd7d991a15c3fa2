//! SQLite-backed library store.

use super::models::*;
use super::schema::LIBRARY_VERSIONED_SCHEMAS;
use super::trait_def::LibraryStore;
use crate::sqlite_persistence::BASE_DB_VERSION;
use anyhow::{bail, Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::info;

pub struct SqliteLibraryStore {
    conn: Arc<Mutex<Connection>>,
}

fn open_or_migrate(conn: &mut Connection) -> Result<()> {
    let latest_version = LIBRARY_VERSIONED_SCHEMAS.len() - 1;
    let latest_schema = &LIBRARY_VERSIONED_SCHEMAS[latest_version];

    let table_count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
        [],
        |r| r.get(0),
    )?;

    if table_count == 0 {
        info!("Creating library db schema at version {}", latest_version);
        latest_schema.create(conn)?;
        return Ok(());
    }

    let db_version: i64 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;
    if db_version < BASE_DB_VERSION as i64 {
        bail!("Library database has unrecognized version {}", db_version);
    }
    let mut current_version = (db_version - BASE_DB_VERSION as i64) as usize;
    if current_version > latest_version {
        bail!("Library database version {} is too new", current_version);
    }

    if current_version < latest_version {
        let tx = conn.transaction()?;
        for schema in LIBRARY_VERSIONED_SCHEMAS.iter().skip(current_version + 1) {
            if let Some(migration_fn) = schema.migration {
                info!(
                    "Migrating library db from version {} to {}",
                    current_version, schema.version
                );
                migration_fn(&tx)?;
                current_version = schema.version;
            }
        }
        tx.pragma_update(None, "user_version", BASE_DB_VERSION + current_version)?;
        tx.commit()?;
    }

    LIBRARY_VERSIONED_SCHEMAS[current_version].validate(conn)?;
    Ok(())
}

impl SqliteLibraryStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let mut conn =
            Connection::open(db_path.as_ref()).context("Failed to open library database")?;
        open_or_migrate(&mut conn)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.execute("PRAGMA foreign_keys = ON;", [])?;

        let store = SqliteLibraryStore {
            conn: Arc::new(Mutex::new(conn)),
        };
        info!(
            "Opened library: {} artists, {} albums, {} songs",
            store.get_artists_count(),
            store.get_albums_count(),
            store.get_songs_count()
        );
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        open_or_migrate(&mut conn)?;
        conn.execute("PRAGMA foreign_keys = ON;", [])?;
        Ok(SqliteLibraryStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn artist_rowid(conn: &Connection, channel_id: &str) -> Result<Option<i64>> {
        Ok(conn
            .query_row(
                "SELECT rowid FROM artists WHERE channel_id = ?1",
                params![channel_id],
                |r| r.get(0),
            )
            .optional()?)
    }

    fn album_rowid(conn: &Connection, browse_id: &str) -> Result<Option<i64>> {
        Ok(conn
            .query_row(
                "SELECT rowid FROM albums WHERE browse_id = ?1",
                params![browse_id],
                |r| r.get(0),
            )
            .optional()?)
    }

    fn song_rowid(conn: &Connection, video_id: &str) -> Result<Option<i64>> {
        Ok(conn
            .query_row(
                "SELECT rowid FROM songs WHERE video_id = ?1",
                params![video_id],
                |r| r.get(0),
            )
            .optional()?)
    }

    fn parse_artist_row(row: &rusqlite::Row) -> rusqlite::Result<Artist> {
        Ok(Artist {
            channel_id: row.get(0)?,
            name: row.get(1)?,
            bio: row.get(2)?,
            albums_params: row.get(3)?,
            singles_params: row.get(4)?,
            needs_discography: row.get::<_, i64>(5)? != 0,
        })
    }

    fn parse_album_row(row: &rusqlite::Row) -> rusqlite::Result<Album> {
        let kind: String = row.get(2)?;
        Ok(Album {
            browse_id: row.get(0)?,
            title: row.get(1)?,
            kind: AlbumKind::from_db_str(&kind),
            year: row.get(3)?,
            track_count: row.get(4)?,
            needs_tracks: row.get::<_, i64>(5)? != 0,
        })
    }

    fn parse_song_row(row: &rusqlite::Row) -> rusqlite::Result<Song> {
        Ok(Song {
            video_id: row.get(0)?,
            title: row.get(1)?,
            duration_secs: row.get(2)?,
            url: row.get(3)?,
        })
    }

    fn count(&self, table: &str) -> usize {
        let conn = self.conn.lock().unwrap();
        conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| {
            r.get::<_, i64>(0)
        })
        .unwrap_or(0) as usize
    }
}

const ARTIST_COLUMNS: &str =
    "channel_id, name, bio, albums_params, singles_params, needs_discography";
const ALBUM_COLUMNS: &str = "browse_id, title, album_type, year, track_count, needs_tracks";
const SONG_COLUMNS: &str = "video_id, title, duration_secs, url";

impl LibraryStore for SqliteLibraryStore {
    fn get_artist(&self, channel_id: &str) -> Result<Option<Artist>> {
        let conn = self.conn.lock().unwrap();
        Ok(conn
            .query_row(
                &format!("SELECT {} FROM artists WHERE channel_id = ?1", ARTIST_COLUMNS),
                params![channel_id],
                Self::parse_artist_row,
            )
            .optional()?)
    }

    fn list_artists(&self) -> Result<Vec<Artist>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt =
            conn.prepare(&format!("SELECT {} FROM artists ORDER BY name", ARTIST_COLUMNS))?;
        let artists = stmt
            .query_map([], Self::parse_artist_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(artists)
    }

    fn upsert_artist(&self, artist: &Artist) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO artists (channel_id, name, bio, albums_params, singles_params) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                artist.channel_id,
                artist.name,
                artist.bio,
                artist.albums_params,
                artist.singles_params
            ],
        )?;
        if inserted == 0 {
            // Row already there: refresh the metadata, leave the latch alone.
            conn.execute(
                "UPDATE artists SET name = ?2, bio = ?3, albums_params = ?4, singles_params = ?5 \
                 WHERE channel_id = ?1",
                params![
                    artist.channel_id,
                    artist.name,
                    artist.bio,
                    artist.albums_params,
                    artist.singles_params
                ],
            )?;
        }
        Ok(inserted > 0)
    }

    fn set_artist_browse_params(
        &self,
        channel_id: &str,
        albums_params: Option<&str>,
        singles_params: Option<&str>,
    ) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let updated = conn.execute(
            "UPDATE artists SET albums_params = ?2, singles_params = ?3 WHERE channel_id = ?1",
            params![channel_id, albums_params, singles_params],
        )?;
        if updated == 0 {
            bail!("No artist with channel id {}", channel_id);
        }
        Ok(())
    }

    fn mark_discography_synced(&self, channel_id: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let updated = conn.execute(
            "UPDATE artists SET needs_discography = 0 WHERE channel_id = ?1",
            params![channel_id],
        )?;
        if updated == 0 {
            bail!("No artist with channel id {}", channel_id);
        }
        Ok(())
    }

    fn get_resolved_artist(&self, channel_id: &str) -> Result<Option<ResolvedArtist>> {
        let artist = match self.get_artist(channel_id)? {
            Some(artist) => artist,
            None => return Ok(None),
        };
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM albums a \
             JOIN artist_albums aa ON aa.album_rowid = a.rowid \
             JOIN artists ar ON ar.rowid = aa.artist_rowid \
             WHERE ar.channel_id = ?1 \
             ORDER BY a.year DESC, a.title",
            ALBUM_COLUMNS
                .split(", ")
                .map(|c| format!("a.{}", c))
                .collect::<Vec<_>>()
                .join(", ")
        ))?;
        let albums = stmt
            .query_map(params![channel_id], Self::parse_album_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Some(ResolvedArtist { artist, albums }))
    }

    fn get_album(&self, browse_id: &str) -> Result<Option<Album>> {
        let conn = self.conn.lock().unwrap();
        Ok(conn
            .query_row(
                &format!("SELECT {} FROM albums WHERE browse_id = ?1", ALBUM_COLUMNS),
                params![browse_id],
                Self::parse_album_row,
            )
            .optional()?)
    }

    fn create_album_if_missing(&self, album: &Album) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO albums (browse_id, title, album_type, year, track_count) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                album.browse_id,
                album.title,
                album.kind.to_db_str(),
                album.year,
                album.track_count
            ],
        )?;
        Ok(inserted > 0)
    }

    fn update_album(&self, album: &Album) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let updated = conn.execute(
            "UPDATE albums SET title = ?2, album_type = ?3, year = ?4, track_count = ?5 \
             WHERE browse_id = ?1",
            params![
                album.browse_id,
                album.title,
                album.kind.to_db_str(),
                album.year,
                album.track_count
            ],
        )?;
        if updated == 0 {
            bail!("No album with browse id {}", album.browse_id);
        }
        Ok(())
    }

    fn link_album_artist(&self, channel_id: &str, browse_id: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let artist_rowid = Self::artist_rowid(&conn, channel_id)?
            .with_context(|| format!("No artist with channel id {}", channel_id))?;
        let album_rowid = Self::album_rowid(&conn, browse_id)?
            .with_context(|| format!("No album with browse id {}", browse_id))?;
        conn.execute(
            "INSERT OR IGNORE INTO artist_albums (artist_rowid, album_rowid) VALUES (?1, ?2)",
            params![artist_rowid, album_rowid],
        )?;
        Ok(())
    }

    fn mark_album_tracks_synced(&self, browse_id: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let updated = conn.execute(
            "UPDATE albums SET needs_tracks = 0 WHERE browse_id = ?1",
            params![browse_id],
        )?;
        if updated == 0 {
            bail!("No album with browse id {}", browse_id);
        }
        Ok(())
    }

    fn get_album_artists(&self, browse_id: &str) -> Result<Vec<String>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT ar.channel_id FROM artists ar \
             JOIN artist_albums aa ON aa.artist_rowid = ar.rowid \
             JOIN albums a ON a.rowid = aa.album_rowid \
             WHERE a.browse_id = ?1",
        )?;
        let channel_ids = stmt
            .query_map(params![browse_id], |r| r.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(channel_ids)
    }

    fn get_resolved_album(&self, browse_id: &str) -> Result<Option<ResolvedAlbum>> {
        let album = match self.get_album(browse_id)? {
            Some(album) => album,
            None => return Ok(None),
        };
        let entries = self.get_album_entries(browse_id)?;

        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM artists ar \
             JOIN artist_albums aa ON aa.artist_rowid = ar.rowid \
             JOIN albums a ON a.rowid = aa.album_rowid \
             WHERE a.browse_id = ?1",
            ARTIST_COLUMNS
                .split(", ")
                .map(|c| format!("ar.{}", c))
                .collect::<Vec<_>>()
                .join(", ")
        ))?;
        let artists = stmt
            .query_map(params![browse_id], Self::parse_artist_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(ResolvedAlbum {
            album,
            artists,
            entries,
        }))
    }

    fn get_song(&self, video_id: &str) -> Result<Option<Song>> {
        let conn = self.conn.lock().unwrap();
        Ok(conn
            .query_row(
                &format!("SELECT {} FROM songs WHERE video_id = ?1", SONG_COLUMNS),
                params![video_id],
                Self::parse_song_row,
            )
            .optional()?)
    }

    fn create_song_if_missing(&self, song: &Song) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO songs (video_id, title, duration_secs, url) \
             VALUES (?1, ?2, ?3, ?4)",
            params![song.video_id, song.title, song.duration_secs, song.url],
        )?;
        Ok(inserted > 0)
    }

    fn update_song(&self, song: &Song) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let updated = conn.execute(
            "UPDATE songs SET title = ?2, duration_secs = ?3, url = ?4 WHERE video_id = ?1",
            params![song.video_id, song.title, song.duration_secs, song.url],
        )?;
        if updated == 0 {
            bail!("No song with video id {}", song.video_id);
        }
        Ok(())
    }

    fn link_album_song(
        &self,
        browse_id: &str,
        video_id: &str,
        disc_number: i64,
        track_number: i64,
    ) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let album_rowid = Self::album_rowid(&conn, browse_id)?
            .with_context(|| format!("No album with browse id {}", browse_id))?;
        let song_rowid = Self::song_rowid(&conn, video_id)?
            .with_context(|| format!("No song with video id {}", video_id))?;

        let occupant: Option<i64> = conn
            .query_row(
                "SELECT song_rowid FROM album_songs \
                 WHERE album_rowid = ?1 AND disc_number = ?2 AND track_number = ?3",
                params![album_rowid, disc_number, track_number],
                |r| r.get(0),
            )
            .optional()?;
        if occupant == Some(song_rowid) {
            return Ok(());
        }

        // An occupied slot falls through to the INSERT so the UNIQUE
        // constraint reports the violation.
        conn.execute(
            "INSERT INTO album_songs (album_rowid, song_rowid, disc_number, track_number) \
             VALUES (?1, ?2, ?3, ?4)",
            params![album_rowid, song_rowid, disc_number, track_number],
        )
        .with_context(|| {
            format!(
                "Slot disc {} track {} on album {} is already taken",
                disc_number, track_number, browse_id
            )
        })?;
        Ok(())
    }

    fn link_song_artist(&self, video_id: &str, channel_id: &str, role: SongRole) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let song_rowid = Self::song_rowid(&conn, video_id)?
            .with_context(|| format!("No song with video id {}", video_id))?;
        let artist_rowid = Self::artist_rowid(&conn, channel_id)?
            .with_context(|| format!("No artist with channel id {}", channel_id))?;
        conn.execute(
            "INSERT OR IGNORE INTO song_artists (song_rowid, artist_rowid, role) VALUES (?1, ?2, ?3)",
            params![song_rowid, artist_rowid, role.to_db_int()],
        )?;
        Ok(())
    }

    fn get_album_entries(&self, browse_id: &str) -> Result<Vec<AlbumEntry>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT s.video_id, s.title, s.duration_secs, s.url, als.disc_number, als.track_number \
             FROM songs s \
             JOIN album_songs als ON als.song_rowid = s.rowid \
             JOIN albums a ON a.rowid = als.album_rowid \
             WHERE a.browse_id = ?1 \
             ORDER BY als.disc_number, als.track_number",
        )?;
        let entries = stmt
            .query_map(params![browse_id], |row| {
                Ok(AlbumEntry {
                    song: Song {
                        video_id: row.get(0)?,
                        title: row.get(1)?,
                        duration_secs: row.get(2)?,
                        url: row.get(3)?,
                    },
                    disc_number: row.get(4)?,
                    track_number: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    fn get_artists_count(&self) -> usize {
        self.count("artists")
    }

    fn get_albums_count(&self) -> usize {
        self.count("albums")
    }

    fn get_songs_count(&self) -> usize {
        self.count("songs")
    }
}
