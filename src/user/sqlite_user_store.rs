use crate::sqlite_column;
use crate::sqlite_persistence::{
    Column, ForeignKey, ForeignKeyOnChange, SqlType, Table, VersionedSchema, BASE_DB_VERSION,
    DEFAULT_TIMESTAMP,
};
use crate::user::auth::{AuthToken, AuthTokenValue, CredentialHasher, UserAuthCredentials, UsernamePasswordCredentials};
use crate::user::user_models::{
    rating_in_range, ContentKind, Favorite, MusicAuthRecord, Rating, RATING_MAX, RATING_MIN,
};
use crate::user::user_store::{UserAuthCredentialsStore, UserAuthTokenStore, UserStore};
use anyhow::{bail, Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::info;

const USER_TABLE: Table = Table {
    name: "user",
    columns: &[
        sqlite_column!(
            "id",
            &SqlType::Integer,
            is_primary_key = true,
            is_unique = true
        ),
        sqlite_column!("handle", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    unique_constraints: &[],
    indices: &[("idx_user_handle", "handle")],
};

const USER_FK: ForeignKey = ForeignKey {
    foreign_table: "user",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::Cascade,
};

const AUTH_TOKEN_TABLE: Table = Table {
    name: "auth_token",
    columns: &[
        sqlite_column!(
            "user_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&USER_FK)
        ),
        sqlite_column!("value", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
        sqlite_column!("last_used", &SqlType::Integer),
    ],
    unique_constraints: &[],
    indices: &[("idx_auth_token_value", "value")],
};

const USER_PASSWORD_CREDENTIALS_TABLE: Table = Table {
    name: "user_password_credentials",
    columns: &[
        sqlite_column!(
            "user_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&USER_FK)
        ),
        sqlite_column!("salt", &SqlType::Text, non_null = true),
        sqlite_column!("hash", &SqlType::Text, non_null = true),
        sqlite_column!("hasher", &SqlType::Text, non_null = true),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
        sqlite_column!("last_tried", &SqlType::Integer),
        sqlite_column!("last_used", &SqlType::Integer),
    ],
    unique_constraints: &[&["user_id"]],
    indices: &[],
};

const MUSIC_AUTH_TABLE: Table = Table {
    name: "music_auth",
    columns: &[
        sqlite_column!(
            "user_id",
            &SqlType::Integer,
            non_null = true,
            is_unique = true,
            foreign_key = Some(&USER_FK)
        ),
        sqlite_column!("auth_file", &SqlType::Text, non_null = true),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
        sqlite_column!(
            "updated",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    unique_constraints: &[],
    indices: &[],
};

const RATING_TABLE: Table = Table {
    name: "rating",
    columns: &[
        sqlite_column!(
            "id",
            &SqlType::Integer,
            is_primary_key = true,
            is_unique = true
        ),
        sqlite_column!(
            "user_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&USER_FK)
        ),
        sqlite_column!("content_kind", &SqlType::Integer, non_null = true),
        sqlite_column!("content_id", &SqlType::Text, non_null = true),
        sqlite_column!("value", &SqlType::Integer, non_null = true),
        sqlite_column!(
            "recommended",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
        sqlite_column!(
            "updated",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    unique_constraints: &[&["user_id", "content_kind", "content_id"]],
    indices: &[("idx_rating_content", "content_id")],
};

const FAVORITE_TABLE: Table = Table {
    name: "favorite",
    columns: &[
        sqlite_column!(
            "id",
            &SqlType::Integer,
            is_primary_key = true,
            is_unique = true
        ),
        sqlite_column!(
            "user_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&USER_FK)
        ),
        sqlite_column!("content_kind", &SqlType::Integer, non_null = true),
        sqlite_column!("content_id", &SqlType::Text, non_null = true),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    unique_constraints: &[&["user_id", "content_kind", "content_id"]],
    indices: &[("idx_favorite_user_id", "user_id")],
};

pub const USER_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[
        USER_TABLE,
        AUTH_TOKEN_TABLE,
        USER_PASSWORD_CREDENTIALS_TABLE,
        MUSIC_AUTH_TABLE,
        RATING_TABLE,
        FAVORITE_TABLE,
    ],
    migration: None,
}];

pub struct SqliteUserStore {
    conn: Arc<Mutex<Connection>>,
}

fn to_unix(time: SystemTime) -> i64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

fn from_unix(secs: i64) -> SystemTime {
    UNIX_EPOCH + Duration::from_secs(secs.max(0) as u64)
}

impl SqliteUserStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path.as_ref()).context("Failed to open user database")?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(mut conn: Connection) -> Result<Self> {
        let latest_version = USER_VERSIONED_SCHEMAS.len() - 1;
        let latest_schema = &USER_VERSIONED_SCHEMAS[latest_version];

        let table_count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
            [],
            |r| r.get(0),
        )?;

        if table_count == 0 {
            info!("Creating user db schema at version {}", latest_version);
            latest_schema.create(&conn)?;
        } else {
            let db_version: i64 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;
            if db_version < BASE_DB_VERSION as i64 {
                bail!("User database has unrecognized version {}", db_version);
            }
            let mut current_version = (db_version - BASE_DB_VERSION as i64) as usize;
            if current_version > latest_version {
                bail!("User database version {} is too new", current_version);
            }
            if current_version < latest_version {
                let tx = conn.transaction()?;
                for schema in USER_VERSIONED_SCHEMAS.iter().skip(current_version + 1) {
                    if let Some(migration_fn) = schema.migration {
                        info!(
                            "Migrating user db from version {} to {}",
                            current_version, schema.version
                        );
                        migration_fn(&tx)?;
                        current_version = schema.version;
                    }
                }
                tx.pragma_update(None, "user_version", BASE_DB_VERSION + current_version)?;
                tx.commit()?;
            }
            USER_VERSIONED_SCHEMAS[current_version].validate(&conn)?;
        }

        conn.execute("PRAGMA foreign_keys = ON;", [])?;
        Ok(SqliteUserStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn parse_rating_row(row: &rusqlite::Row) -> rusqlite::Result<(i32, Rating)> {
        let kind_int: i32 = row.get(1)?;
        Ok((
            kind_int,
            Rating {
                user_id: row.get::<_, i64>(0)? as usize,
                // Placeholder, replaced by the caller after kind validation
                kind: ContentKind::Artist,
                content_id: row.get(2)?,
                value: row.get(3)?,
                recommended: row.get::<_, i64>(4)? != 0,
                created: row.get(5)?,
                updated: row.get(6)?,
            },
        ))
    }
}

const RATING_COLUMNS: &str =
    "user_id, content_kind, content_id, value, recommended, created, updated";

impl UserStore for SqliteUserStore {
    fn create_user(&self, user_handle: &str) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        conn.execute("INSERT INTO user (handle) VALUES (?1)", params![user_handle])
            .with_context(|| format!("Failed to create user {}", user_handle))?;
        Ok(conn.last_insert_rowid() as usize)
    }

    fn get_user_handle(&self, user_id: usize) -> Result<Option<String>> {
        let conn = self.conn.lock().unwrap();
        Ok(conn
            .query_row(
                "SELECT handle FROM user WHERE id = ?1",
                params![user_id],
                |row| row.get(0),
            )
            .optional()?)
    }

    fn get_user_id(&self, user_handle: &str) -> Result<Option<usize>> {
        let conn = self.conn.lock().unwrap();
        Ok(conn
            .query_row(
                "SELECT id FROM user WHERE handle = ?1",
                params![user_handle],
                |row| row.get::<_, i64>(0),
            )
            .optional()?
            .map(|id| id as usize))
    }

    fn get_all_user_handles(&self) -> Result<Vec<String>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT handle FROM user ORDER BY id")?;
        let handles = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(handles)
    }

    fn set_rating(
        &self,
        user_id: usize,
        kind: ContentKind,
        content_id: &str,
        value: i32,
        recommended: bool,
    ) -> Result<()> {
        if !rating_in_range(value) {
            bail!(
                "Rating {} out of range [{}, {}]",
                value,
                RATING_MIN,
                RATING_MAX
            );
        }
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO rating (user_id, content_kind, content_id, value, recommended) \
             VALUES (?1, ?2, ?3, ?4, ?5) \
             ON CONFLICT (user_id, content_kind, content_id) \
             DO UPDATE SET value = ?4, recommended = ?5, updated = cast(strftime('%s','now') as int)",
            params![user_id, kind.to_int(), content_id, value, recommended as i32],
        )?;
        Ok(())
    }

    fn get_rating(
        &self,
        user_id: usize,
        kind: ContentKind,
        content_id: &str,
    ) -> Result<Option<Rating>> {
        let conn = self.conn.lock().unwrap();
        let row = conn
            .query_row(
                &format!(
                    "SELECT {} FROM rating WHERE user_id = ?1 AND content_kind = ?2 AND content_id = ?3",
                    RATING_COLUMNS
                ),
                params![user_id, kind.to_int(), content_id],
                Self::parse_rating_row,
            )
            .optional()?;
        Ok(row.map(|(_, mut rating)| {
            rating.kind = kind;
            rating
        }))
    }

    fn delete_rating(&self, user_id: usize, kind: ContentKind, content_id: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "DELETE FROM rating WHERE user_id = ?1 AND content_kind = ?2 AND content_id = ?3",
            params![user_id, kind.to_int(), content_id],
        )?;
        Ok(())
    }

    fn list_ratings(&self, user_id: usize, kind: Option<ContentKind>) -> Result<Vec<Rating>> {
        let conn = self.conn.lock().unwrap();
        let mut sql = format!(
            "SELECT {} FROM rating WHERE user_id = ?1",
            RATING_COLUMNS
        );
        if kind.is_some() {
            sql.push_str(" AND content_kind = ?2");
        }
        sql.push_str(" ORDER BY updated DESC, id DESC");

        let mut stmt = conn.prepare(&sql)?;
        let map_row = |row: &rusqlite::Row| Self::parse_rating_row(row);
        let rows: Vec<(i32, Rating)> = match kind {
            Some(kind) => stmt
                .query_map(params![user_id, kind.to_int()], map_row)?
                .collect::<Result<_, _>>()?,
            None => stmt
                .query_map(params![user_id], map_row)?
                .collect::<Result<_, _>>()?,
        };
        Ok(rows
            .into_iter()
            .filter_map(|(kind_int, mut rating)| {
                ContentKind::from_int(kind_int).map(|kind| {
                    rating.kind = kind;
                    rating
                })
            })
            .collect())
    }

    fn average_rating(&self, kind: ContentKind, content_id: &str) -> Result<Option<f64>> {
        let conn = self.conn.lock().unwrap();
        Ok(conn.query_row(
            "SELECT AVG(value) FROM rating WHERE content_kind = ?1 AND content_id = ?2",
            params![kind.to_int(), content_id],
            |row| row.get(0),
        )?)
    }

    fn add_favorite(&self, user_id: usize, kind: ContentKind, content_id: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT OR IGNORE INTO favorite (user_id, content_kind, content_id) VALUES (?1, ?2, ?3)",
            params![user_id, kind.to_int(), content_id],
        )?;
        Ok(())
    }

    fn remove_favorite(&self, user_id: usize, kind: ContentKind, content_id: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "DELETE FROM favorite WHERE user_id = ?1 AND content_kind = ?2 AND content_id = ?3",
            params![user_id, kind.to_int(), content_id],
        )?;
        Ok(())
    }

    fn is_favorite(&self, user_id: usize, kind: ContentKind, content_id: &str) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM favorite WHERE user_id = ?1 AND content_kind = ?2 AND content_id = ?3",
            params![user_id, kind.to_int(), content_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn list_favorites(&self, user_id: usize, kind: Option<ContentKind>) -> Result<Vec<Favorite>> {
        let conn = self.conn.lock().unwrap();
        let mut sql =
            "SELECT user_id, content_kind, content_id, created FROM favorite WHERE user_id = ?1"
                .to_string();
        if kind.is_some() {
            sql.push_str(" AND content_kind = ?2");
        }
        sql.push_str(" ORDER BY created DESC, id DESC");

        let mut stmt = conn.prepare(&sql)?;
        let map_row = |row: &rusqlite::Row| {
            Ok((
                row.get::<_, i32>(1)?,
                Favorite {
                    user_id: row.get::<_, i64>(0)? as usize,
                    kind: ContentKind::Artist, // placeholder
                    content_id: row.get(2)?,
                    created: row.get(3)?,
                },
            ))
        };
        let rows: Vec<(i32, Favorite)> = match kind {
            Some(kind) => stmt
                .query_map(params![user_id, kind.to_int()], map_row)?
                .collect::<Result<_, _>>()?,
            None => stmt
                .query_map(params![user_id], map_row)?
                .collect::<Result<_, _>>()?,
        };
        Ok(rows
            .into_iter()
            .filter_map(|(kind_int, mut favorite)| {
                ContentKind::from_int(kind_int).map(|kind| {
                    favorite.kind = kind;
                    favorite
                })
            })
            .collect())
    }

    fn set_music_auth(&self, user_id: usize, auth_file: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO music_auth (user_id, auth_file) VALUES (?1, ?2) \
             ON CONFLICT (user_id) \
             DO UPDATE SET auth_file = ?2, updated = cast(strftime('%s','now') as int)",
            params![user_id, auth_file],
        )?;
        Ok(())
    }

    fn get_music_auth(&self, user_id: usize) -> Result<Option<MusicAuthRecord>> {
        let conn = self.conn.lock().unwrap();
        Ok(conn
            .query_row(
                "SELECT user_id, auth_file, created, updated FROM music_auth WHERE user_id = ?1",
                params![user_id],
                |row| {
                    Ok(MusicAuthRecord {
                        user_id: row.get::<_, i64>(0)? as usize,
                        auth_file: row.get(1)?,
                        created: row.get(2)?,
                        updated: row.get(3)?,
                    })
                },
            )
            .optional()?)
    }
}

impl UserAuthTokenStore for SqliteUserStore {
    fn get_user_auth_token(&self, token: &AuthTokenValue) -> Result<Option<AuthToken>> {
        let conn = self.conn.lock().unwrap();
        Ok(conn
            .query_row(
                "SELECT user_id, value, created, last_used FROM auth_token WHERE value = ?1",
                params![token.0],
                |row| {
                    Ok(AuthToken {
                        user_id: row.get::<_, i64>(0)? as usize,
                        value: AuthTokenValue(row.get(1)?),
                        created: from_unix(row.get(2)?),
                        last_used: row.get::<_, Option<i64>>(3)?.map(from_unix),
                    })
                },
            )
            .optional()?)
    }

    fn delete_user_auth_token(&self, token: &AuthTokenValue) -> Result<Option<AuthToken>> {
        let existing = self.get_user_auth_token(token)?;
        if existing.is_some() {
            let conn = self.conn.lock().unwrap();
            conn.execute("DELETE FROM auth_token WHERE value = ?1", params![token.0])?;
        }
        Ok(existing)
    }

    fn update_user_auth_token_last_used_timestamp(&self, token: &AuthTokenValue) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE auth_token SET last_used = cast(strftime('%s','now') as int) WHERE value = ?1",
            params![token.0],
        )?;
        Ok(())
    }

    fn add_user_auth_token(&self, token: AuthToken) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO auth_token (user_id, value, created, last_used) VALUES (?1, ?2, ?3, ?4)",
            params![
                token.user_id,
                token.value.0,
                to_unix(token.created),
                token.last_used.map(to_unix)
            ],
        )?;
        Ok(())
    }
}

impl UserAuthCredentialsStore for SqliteUserStore {
    fn get_user_auth_credentials(&self, user_handle: &str) -> Result<Option<UserAuthCredentials>> {
        let user_id = match self.get_user_id(user_handle)? {
            Some(id) => id,
            None => return Ok(None),
        };
        let conn = self.conn.lock().unwrap();
        let username_password = conn
            .query_row(
                "SELECT salt, hash, hasher, created, last_tried, last_used \
                 FROM user_password_credentials WHERE user_id = ?1",
                params![user_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, i64>(3)?,
                        row.get::<_, Option<i64>>(4)?,
                        row.get::<_, Option<i64>>(5)?,
                    ))
                },
            )
            .optional()?
            .map(|(salt, hash, hasher, created, last_tried, last_used)| {
                let hasher = CredentialHasher::from_str(&hasher)?;
                Ok::<_, anyhow::Error>(UsernamePasswordCredentials {
                    user_id,
                    salt,
                    hash,
                    hasher,
                    created: from_unix(created),
                    last_tried: last_tried.map(from_unix),
                    last_used: last_used.map(from_unix),
                })
            })
            .transpose()?;

        Ok(Some(UserAuthCredentials {
            user_id,
            username_password,
        }))
    }

    fn update_user_auth_credentials(&self, credentials: UserAuthCredentials) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        match credentials.username_password {
            Some(pw) => {
                conn.execute(
                    "INSERT INTO user_password_credentials \
                     (user_id, salt, hash, hasher, created, last_tried, last_used) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7) \
                     ON CONFLICT (user_id) \
                     DO UPDATE SET salt = ?2, hash = ?3, hasher = ?4",
                    params![
                        pw.user_id,
                        pw.salt,
                        pw.hash,
                        pw.hasher.to_string(),
                        to_unix(pw.created),
                        pw.last_tried.map(to_unix),
                        pw.last_used.map(to_unix)
                    ],
                )?;
            }
            None => {
                conn.execute(
                    "DELETE FROM user_password_credentials WHERE user_id = ?1",
                    params![credentials.user_id],
                )?;
            }
        }
        Ok(())
    }
}
