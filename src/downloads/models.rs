//! Models for the downloads facility.

use serde::{Deserialize, Serialize};

/// Metadata-only extraction result for a video URL.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VideoMetadata {
    pub url: String,
    pub title: Option<String>,
    pub author: Option<String>,
    pub author_url: Option<String>,
    #[serde(default)]
    pub playlist: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// A queued extraction request.
#[derive(Clone, Debug, Serialize)]
pub struct DownloadRequest {
    pub id: usize,
    pub user_id: usize,
    pub url: String,
    /// Unix timestamps; `finished_at` stays None when the extraction failed.
    pub created: i64,
    pub finished_at: Option<i64>,
}

/// A completed extraction, one row per processed URL.
#[derive(Clone, Debug, Serialize)]
pub struct DownloadedFile {
    pub id: usize,
    pub user_id: usize,
    pub url: String,
    pub title: Option<String>,
    pub author: Option<String>,
    pub author_url: Option<String>,
    pub playlist: Option<String>,
    pub description: Option<String>,
    pub created: i64,
}
