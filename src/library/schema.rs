//! SQLite schema for the mirrored library database.
//!
//! Primary keys are integer rowids; the upstream ids (channel id, browse id,
//! video id) carry UNIQUE constraints and are the only keys used by callers.
//! The `album_songs` join is unique per (album, disc, track) so a duplicate
//! position insert fails the constraint rather than producing a second row.

use crate::sqlite_column;
use crate::sqlite_persistence::{
    Column, ForeignKey, ForeignKeyOnChange, SqlType, Table, VersionedSchema, DEFAULT_TIMESTAMP,
};

const ARTISTS_TABLE: Table = Table {
    name: "artists",
    columns: &[
        sqlite_column!("rowid", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("channel_id", &SqlType::Text, non_null = true),
        sqlite_column!("name", &SqlType::Text, non_null = true),
        sqlite_column!("bio", &SqlType::Text),
        sqlite_column!("albums_params", &SqlType::Text),
        sqlite_column!("singles_params", &SqlType::Text),
        sqlite_column!(
            "needs_discography",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("1")
        ),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[("idx_artists_channel_id", "channel_id")],
    unique_constraints: &[&["channel_id"]],
};

const ALBUMS_TABLE: Table = Table {
    name: "albums",
    columns: &[
        sqlite_column!("rowid", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("browse_id", &SqlType::Text, non_null = true),
        sqlite_column!("title", &SqlType::Text, non_null = true),
        sqlite_column!("album_type", &SqlType::Text, non_null = true), // 'ALBUM', 'SINGLE', 'EP', 'COMPILATION'
        sqlite_column!("year", &SqlType::Integer),
        sqlite_column!("track_count", &SqlType::Integer),
        sqlite_column!(
            "needs_tracks",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("1")
        ),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[("idx_albums_browse_id", "browse_id")],
    unique_constraints: &[&["browse_id"]],
};

const SONGS_TABLE: Table = Table {
    name: "songs",
    columns: &[
        sqlite_column!("rowid", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("video_id", &SqlType::Text, non_null = true),
        sqlite_column!("title", &SqlType::Text, non_null = true),
        sqlite_column!("duration_secs", &SqlType::Integer),
        sqlite_column!("url", &SqlType::Text),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[("idx_songs_video_id", "video_id")],
    unique_constraints: &[&["video_id"]],
};

const ALBUM_FK: ForeignKey = ForeignKey {
    foreign_table: "albums",
    foreign_column: "rowid",
    on_delete: ForeignKeyOnChange::Cascade,
};

const SONG_FK: ForeignKey = ForeignKey {
    foreign_table: "songs",
    foreign_column: "rowid",
    on_delete: ForeignKeyOnChange::Cascade,
};

const ARTIST_FK: ForeignKey = ForeignKey {
    foreign_table: "artists",
    foreign_column: "rowid",
    on_delete: ForeignKeyOnChange::Cascade,
};

/// Album <-> Song join with position, one row per slot on the album.
const ALBUM_SONGS_TABLE: Table = Table {
    name: "album_songs",
    columns: &[
        sqlite_column!(
            "album_rowid",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&ALBUM_FK)
        ),
        sqlite_column!(
            "song_rowid",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&SONG_FK)
        ),
        sqlite_column!(
            "disc_number",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("1")
        ),
        sqlite_column!("track_number", &SqlType::Integer, non_null = true),
    ],
    indices: &[
        ("idx_album_songs_album", "album_rowid"),
        ("idx_album_songs_song", "song_rowid"),
    ],
    unique_constraints: &[&["album_rowid", "disc_number", "track_number"]],
};

/// Artist <-> Album link, written when the album row is first created.
const ARTIST_ALBUMS_TABLE: Table = Table {
    name: "artist_albums",
    columns: &[
        sqlite_column!(
            "artist_rowid",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&ARTIST_FK)
        ),
        sqlite_column!(
            "album_rowid",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&ALBUM_FK)
        ),
    ],
    indices: &[
        ("idx_artist_albums_artist", "artist_rowid"),
        ("idx_artist_albums_album", "album_rowid"),
    ],
    unique_constraints: &[&["artist_rowid", "album_rowid"]],
};

/// Song <-> Artist link with role.
const SONG_ARTISTS_TABLE: Table = Table {
    name: "song_artists",
    columns: &[
        sqlite_column!(
            "song_rowid",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&SONG_FK)
        ),
        sqlite_column!(
            "artist_rowid",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&ARTIST_FK)
        ),
        sqlite_column!("role", &SqlType::Integer, non_null = true), // 0=primary, 1=featured
    ],
    indices: &[
        ("idx_song_artists_song", "song_rowid"),
        ("idx_song_artists_artist", "artist_rowid"),
    ],
    unique_constraints: &[&["song_rowid", "artist_rowid", "role"]],
};

pub const LIBRARY_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[
        ARTISTS_TABLE,
        ALBUMS_TABLE,
        SONGS_TABLE,
        ALBUM_SONGS_TABLE,
        ARTIST_ALBUMS_TABLE,
        SONG_ARTISTS_TABLE,
    ],
    migration: None,
}];

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::{params, Connection};

    fn open_with_schema() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        LIBRARY_VERSIONED_SCHEMAS[0].create(&conn).unwrap();
        conn
    }

    #[test]
    fn schema_creates_and_validates() {
        let conn = open_with_schema();
        LIBRARY_VERSIONED_SCHEMAS[0].validate(&conn).unwrap();
    }

    #[test]
    fn duplicate_channel_id_rejected() {
        let conn = open_with_schema();
        conn.execute(
            "INSERT INTO artists (channel_id, name) VALUES ('UC1', 'First')",
            [],
        )
        .unwrap();
        let result = conn.execute(
            "INSERT INTO artists (channel_id, name) VALUES ('UC1', 'Second')",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn duplicate_album_slot_rejected() {
        let conn = open_with_schema();
        conn.execute(
            "INSERT INTO albums (browse_id, title, album_type) VALUES ('MPREb1', 'LP', 'ALBUM')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO songs (video_id, title) VALUES ('v1', 'One')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO songs (video_id, title) VALUES ('v2', 'Two')",
            [],
        )
        .unwrap();

        let album_rowid: i64 = conn
            .query_row("SELECT rowid FROM albums WHERE browse_id = 'MPREb1'", [], |r| {
                r.get(0)
            })
            .unwrap();
        let song1: i64 = conn
            .query_row("SELECT rowid FROM songs WHERE video_id = 'v1'", [], |r| {
                r.get(0)
            })
            .unwrap();
        let song2: i64 = conn
            .query_row("SELECT rowid FROM songs WHERE video_id = 'v2'", [], |r| {
                r.get(0)
            })
            .unwrap();

        conn.execute(
            "INSERT INTO album_songs (album_rowid, song_rowid, disc_number, track_number) VALUES (?1, ?2, 1, 1)",
            params![album_rowid, song1],
        )
        .unwrap();

        // Same (album, disc, track) slot with a different song must fail
        let result = conn.execute(
            "INSERT INTO album_songs (album_rowid, song_rowid, disc_number, track_number) VALUES (?1, ?2, 1, 1)",
            params![album_rowid, song2],
        );
        assert!(result.is_err());

        // A different disc with the same track number is a distinct slot
        conn.execute(
            "INSERT INTO album_songs (album_rowid, song_rowid, disc_number, track_number) VALUES (?1, ?2, 2, 1)",
            params![album_rowid, song2],
        )
        .unwrap();
    }

    #[test]
    fn new_rows_default_their_latches_on() {
        let conn = open_with_schema();
        conn.execute(
            "INSERT INTO artists (channel_id, name) VALUES ('UC1', 'Band')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO albums (browse_id, title, album_type) VALUES ('MPREb1', 'LP', 'ALBUM')",
            [],
        )
        .unwrap();

        let needs_discography: i64 = conn
            .query_row(
                "SELECT needs_discography FROM artists WHERE channel_id = 'UC1'",
                [],
                |r| r.get(0),
            )
            .unwrap();
        let needs_tracks: i64 = conn
            .query_row(
                "SELECT needs_tracks FROM albums WHERE browse_id = 'MPREb1'",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(needs_discography, 1);
        assert_eq!(needs_tracks, 1);
    }
}
