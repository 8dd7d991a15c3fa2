//! SQLite schema for the downloads database.

use crate::sqlite_column;
use crate::sqlite_persistence::{Column, SqlType, Table, VersionedSchema, DEFAULT_TIMESTAMP};

const DOWNLOAD_QUEUE_TABLE: Table = Table {
    name: "download_queue",
    columns: &[
        sqlite_column!(
            "id",
            &SqlType::Integer,
            is_primary_key = true,
            is_unique = true
        ),
        sqlite_column!("user_id", &SqlType::Integer, non_null = true),
        sqlite_column!("url", &SqlType::Text, non_null = true),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
        sqlite_column!("finished_at", &SqlType::Integer),
    ],
    indices: &[("idx_download_queue_user", "user_id")],
    unique_constraints: &[],
};

const DOWNLOADED_FILE_TABLE: Table = Table {
    name: "downloaded_file",
    columns: &[
        sqlite_column!(
            "id",
            &SqlType::Integer,
            is_primary_key = true,
            is_unique = true
        ),
        sqlite_column!("user_id", &SqlType::Integer, non_null = true),
        sqlite_column!("url", &SqlType::Text, non_null = true),
        sqlite_column!("title", &SqlType::Text),
        sqlite_column!("author", &SqlType::Text),
        sqlite_column!("author_url", &SqlType::Text),
        sqlite_column!("playlist", &SqlType::Text),
        sqlite_column!("description", &SqlType::Text),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[("idx_downloaded_file_user", "user_id")],
    unique_constraints: &[],
};

pub const DOWNLOADS_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[DOWNLOAD_QUEUE_TABLE, DOWNLOADED_FILE_TABLE],
    migration: None,
}];

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn schema_creates_and_validates() {
        let conn = Connection::open_in_memory().unwrap();
        DOWNLOADS_VERSIONED_SCHEMAS[0].create(&conn).unwrap();
        DOWNLOADS_VERSIONED_SCHEMAS[0].validate(&conn).unwrap();
    }
}
