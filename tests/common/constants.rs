//! Shared constants for end-to-end tests
//!
//! This module contains all constants used across the test suite.
//! When test data changes (user credentials, canned upstream catalog, etc.),
//! update only this file.

// ============================================================================
// Test User Credentials
// ============================================================================

/// Regular test user handle
pub const TEST_USER: &str = "testuser";

/// Regular test user password
pub const TEST_PASS: &str = "testpass123";

/// Second test user handle (for cross-user assertions)
pub const OTHER_USER: &str = "otheruser";

/// Second test user password
pub const OTHER_PASS: &str = "otherpass123";

// ============================================================================
// Canned Upstream Catalog
// ============================================================================

/// Channel id for "The Test Band"
pub const ARTIST_1_CHANNEL_ID: &str = "UCband1";

/// Channel id for "Jazz Ensemble"
pub const ARTIST_2_CHANNEL_ID: &str = "UCjazz2";

/// Artist 1 name
pub const ARTIST_1_NAME: &str = "The Test Band";

/// Artist 2 name
pub const ARTIST_2_NAME: &str = "Jazz Ensemble";

/// Browse id of "First Album" by The Test Band
pub const ALBUM_1_BROWSE_ID: &str = "MPREb_first";

/// Browse id of "Lone Single" by The Test Band
pub const ALBUM_2_BROWSE_ID: &str = "MPREb_single";

/// Browse id of "Jazz Collection" by Jazz Ensemble
pub const ALBUM_3_BROWSE_ID: &str = "MPREb_jazz";

/// Album 1 title
pub const ALBUM_1_TITLE: &str = "First Album";

/// Album 2 title
pub const ALBUM_2_TITLE: &str = "Lone Single";

/// Album 3 title
pub const ALBUM_3_TITLE: &str = "Jazz Collection";

/// Albums-shelf pagination token of artist 1
pub const ARTIST_1_ALBUMS_PARAMS: &str = "params-band1-albums";

/// Video ids of the songs on "First Album", in track order
pub const SONG_1_VIDEO_ID: &str = "video1";
pub const SONG_2_VIDEO_ID: &str = "video2";

/// Video id of the song on "Lone Single"
pub const SONG_3_VIDEO_ID: &str = "video3";

/// Video id of the song on "Jazz Collection"
pub const SONG_4_VIDEO_ID: &str = "video4";

// ============================================================================
// Downloads
// ============================================================================

/// A URL the mock extractor resolves
pub const DOWNLOAD_URL: &str = "https://videos.example/watch?v=abc123";

/// A URL the mock extractor fails on
pub const BROKEN_DOWNLOAD_URL: &str = "https://videos.example/watch?v=broken";

// ============================================================================
// Test Timeouts and Configuration
// ============================================================================

/// Maximum time to wait for server to become ready (milliseconds)
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;

/// Timeout for individual HTTP requests (seconds)
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Polling interval when waiting for server ready (milliseconds)
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 50;
