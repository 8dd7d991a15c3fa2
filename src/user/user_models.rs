//! User data models: the content-kind discriminator and the per-user
//! annotations (ratings, favorites, registered music credentials).

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Rating bounds, inclusive. -5 is strong dislike, 5 is absolute favorite.
pub const RATING_MIN: i32 = -5;
pub const RATING_MAX: i32 = 5;

/// Tagged discriminator for the three annotatable entity kinds. One
/// annotation table serves all of them; the kind is stored as an integer
/// next to the external id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Artist,
    Album,
    Song,
}

impl ContentKind {
    pub fn to_int(&self) -> i32 {
        match self {
            ContentKind::Artist => 1,
            ContentKind::Album => 2,
            ContentKind::Song => 3,
        }
    }

    pub fn from_int(value: i32) -> Option<Self> {
        match value {
            1 => Some(ContentKind::Artist),
            2 => Some(ContentKind::Album),
            3 => Some(ContentKind::Song),
            _ => None,
        }
    }
}

impl FromStr for ContentKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "artist" => Ok(ContentKind::Artist),
            "album" => Ok(ContentKind::Album),
            "song" => Ok(ContentKind::Song),
            _ => Err(()),
        }
    }
}

/// A user's rating of an artist, album or song.
#[derive(Debug, Clone, Serialize)]
pub struct Rating {
    pub user_id: usize,
    pub kind: ContentKind,
    pub content_id: String,
    pub value: i32,
    pub recommended: bool,
    /// Unix timestamps
    pub created: i64,
    pub updated: i64,
}

/// A favorited artist, album or song.
#[derive(Debug, Clone, Serialize)]
pub struct Favorite {
    pub user_id: usize,
    pub kind: ContentKind,
    pub content_id: String,
    /// Unix timestamp
    pub created: i64,
}

/// The registered per-user music-service credentials file.
#[derive(Debug, Clone, Serialize)]
pub struct MusicAuthRecord {
    pub user_id: usize,
    pub auth_file: String,
    pub created: i64,
    pub updated: i64,
}

/// True when the value is an acceptable rating.
pub fn rating_in_range(value: i32) -> bool {
    (RATING_MIN..=RATING_MAX).contains(&value)
}
