//! SQLite-backed queue and completed-files store for the downloads facility.

use super::models::{DownloadRequest, DownloadedFile, VideoMetadata};
use super::schema::DOWNLOADS_VERSIONED_SCHEMAS;
use crate::sqlite_persistence::BASE_DB_VERSION;
use anyhow::{bail, Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::info;

pub trait DownloadStore: Send + Sync {
    /// Queue a request, returning its id.
    fn enqueue(&self, user_id: usize, url: &str) -> Result<usize>;

    /// Stamp a queued request finished.
    fn mark_finished(&self, request_id: usize) -> Result<()>;

    /// Record a completed extraction, returning the row id.
    fn add_completed(&self, user_id: usize, metadata: &VideoMetadata) -> Result<usize>;

    /// The user's queue, oldest first (finished rows included).
    fn list_queue(&self, user_id: usize) -> Result<Vec<DownloadRequest>>;

    /// The user's completed extractions, newest first.
    fn list_completed(&self, user_id: usize) -> Result<Vec<DownloadedFile>>;

    fn get_completed(&self, id: usize) -> Result<Option<DownloadedFile>>;
}

pub struct SqliteDownloadStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteDownloadStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn =
            Connection::open(db_path.as_ref()).context("Failed to open downloads database")?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        let table_count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
            [],
            |r| r.get(0),
        )?;

        if table_count == 0 {
            info!("Creating downloads db schema");
            DOWNLOADS_VERSIONED_SCHEMAS[0].create(&conn)?;
        } else {
            let db_version: i64 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;
            if db_version < BASE_DB_VERSION as i64 {
                bail!("Downloads database has unrecognized version {}", db_version);
            }
            let version = (db_version - BASE_DB_VERSION as i64) as usize;
            match DOWNLOADS_VERSIONED_SCHEMAS.get(version) {
                Some(schema) => schema.validate(&conn)?,
                None => bail!("Downloads database version {} is too new", version),
            }
        }

        Ok(SqliteDownloadStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn parse_completed_row(row: &rusqlite::Row) -> rusqlite::Result<DownloadedFile> {
        Ok(DownloadedFile {
            id: row.get::<_, i64>(0)? as usize,
            user_id: row.get::<_, i64>(1)? as usize,
            url: row.get(2)?,
            title: row.get(3)?,
            author: row.get(4)?,
            author_url: row.get(5)?,
            playlist: row.get(6)?,
            description: row.get(7)?,
            created: row.get(8)?,
        })
    }
}

const COMPLETED_COLUMNS: &str =
    "id, user_id, url, title, author, author_url, playlist, description, created";

impl DownloadStore for SqliteDownloadStore {
    fn enqueue(&self, user_id: usize, url: &str) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO download_queue (user_id, url) VALUES (?1, ?2)",
            params![user_id, url],
        )?;
        Ok(conn.last_insert_rowid() as usize)
    }

    fn mark_finished(&self, request_id: usize) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let updated = conn.execute(
            "UPDATE download_queue SET finished_at = cast(strftime('%s','now') as int) WHERE id = ?1",
            params![request_id],
        )?;
        if updated == 0 {
            bail!("No queued download with id {}", request_id);
        }
        Ok(())
    }

    fn add_completed(&self, user_id: usize, metadata: &VideoMetadata) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO downloaded_file (user_id, url, title, author, author_url, playlist, description) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                user_id,
                metadata.url,
                metadata.title,
                metadata.author,
                metadata.author_url,
                metadata.playlist,
                metadata.description
            ],
        )?;
        Ok(conn.last_insert_rowid() as usize)
    }

    fn list_queue(&self, user_id: usize) -> Result<Vec<DownloadRequest>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, user_id, url, created, finished_at FROM download_queue \
             WHERE user_id = ?1 ORDER BY id",
        )?;
        let requests = stmt
            .query_map(params![user_id], |row| {
                Ok(DownloadRequest {
                    id: row.get::<_, i64>(0)? as usize,
                    user_id: row.get::<_, i64>(1)? as usize,
                    url: row.get(2)?,
                    created: row.get(3)?,
                    finished_at: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(requests)
    }

    fn list_completed(&self, user_id: usize) -> Result<Vec<DownloadedFile>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM downloaded_file WHERE user_id = ?1 ORDER BY id DESC",
            COMPLETED_COLUMNS
        ))?;
        let files = stmt
            .query_map(params![user_id], Self::parse_completed_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(files)
    }

    fn get_completed(&self, id: usize) -> Result<Option<DownloadedFile>> {
        let conn = self.conn.lock().unwrap();
        Ok(conn
            .query_row(
                &format!("SELECT {} FROM downloaded_file WHERE id = ?1", COMPLETED_COLUMNS),
                params![id],
                Self::parse_completed_row,
            )
            .optional()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata(url: &str) -> VideoMetadata {
        VideoMetadata {
            url: url.to_string(),
            title: Some("A Video".to_string()),
            author: Some("Uploader".to_string()),
            author_url: Some("https://videos.example/uploader".to_string()),
            playlist: None,
            description: Some("description".to_string()),
        }
    }

    #[test]
    fn queue_lifecycle() {
        let store = SqliteDownloadStore::open_in_memory().unwrap();
        let id = store.enqueue(1, "https://videos.example/w?v=abc").unwrap();

        let queue = store.list_queue(1).unwrap();
        assert_eq!(queue.len(), 1);
        assert!(queue[0].finished_at.is_none());

        store.mark_finished(id).unwrap();
        let queue = store.list_queue(1).unwrap();
        assert!(queue[0].finished_at.is_some());

        assert!(store.mark_finished(999).is_err());
    }

    #[test]
    fn completed_files_are_per_user_newest_first() {
        let store = SqliteDownloadStore::open_in_memory().unwrap();
        let first = store.add_completed(1, &metadata("https://v/1")).unwrap();
        let second = store.add_completed(1, &metadata("https://v/2")).unwrap();
        store.add_completed(2, &metadata("https://v/3")).unwrap();

        let files = store.list_completed(1).unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].id, second);
        assert_eq!(files[1].id, first);

        let fetched = store.get_completed(first).unwrap().unwrap();
        assert_eq!(fetched.url, "https://v/1");
        assert!(store.get_completed(9999).unwrap().is_none());
    }
}
