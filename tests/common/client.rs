//! HTTP client for end-to-end tests
//!
//! This module provides a high-level HTTP client that wraps reqwest
//! and provides methods for all mirror-server endpoints.
//!
//! When API routes or request formats change, update only this file.

use super::constants::*;
use reqwest::Response;
use serde_json::json;
use std::time::Duration;

/// HTTP test client with cookie-based session management
pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
}

impl TestClient {
    /// Creates a new unauthenticated client
    ///
    /// Use this for testing authentication flows.
    /// For most tests, use `authenticated()` instead.
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .cookie_store(true) // Automatically handle session cookies
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self { client, base_url }
    }

    /// Creates a client pre-authenticated as the regular test user
    ///
    /// # Panics
    ///
    /// Panics if authentication fails (indicates test infrastructure problem).
    pub async fn authenticated(base_url: String) -> Self {
        Self::authenticated_as(base_url, TEST_USER, TEST_PASS).await
    }

    /// Creates a client pre-authenticated as the given user
    pub async fn authenticated_as(base_url: String, handle: &str, password: &str) -> Self {
        let client = Self::new(base_url);

        let response = client.login(handle, password).await;
        assert_eq!(
            response.status(),
            reqwest::StatusCode::CREATED,
            "Test user authentication failed: {:?}",
            response.text().await
        );

        client
    }

    // ========================================================================
    // Authentication Endpoints
    // ========================================================================

    /// POST /v1/auth/login
    pub async fn login(&self, handle: &str, password: &str) -> Response {
        self.client
            .post(format!("{}/v1/auth/login", self.base_url))
            .json(&json!({
                "user_handle": handle,
                "password": password
            }))
            .send()
            .await
            .expect("Login request failed")
    }

    /// GET /v1/auth/logout
    pub async fn logout(&self) -> Response {
        self.client
            .get(format!("{}/v1/auth/logout", self.base_url))
            .send()
            .await
            .expect("Logout request failed")
    }

    /// GET /
    pub async fn get_stats(&self) -> Response {
        self.client
            .get(format!("{}/", self.base_url))
            .send()
            .await
            .expect("Get stats request failed")
    }

    // ========================================================================
    // Library Endpoints
    // ========================================================================

    /// GET /v1/library/artists
    pub async fn get_artists(&self) -> Response {
        self.client
            .get(format!("{}/v1/library/artists", self.base_url))
            .send()
            .await
            .expect("Get artists request failed")
    }

    /// GET /v1/library/artist/{id}
    pub async fn get_artist(&self, id: &str) -> Response {
        self.client
            .get(format!("{}/v1/library/artist/{}", self.base_url, id))
            .send()
            .await
            .expect("Get artist request failed")
    }

    /// GET /v1/library/album/{id}
    pub async fn get_album(&self, id: &str) -> Response {
        self.client
            .get(format!("{}/v1/library/album/{}", self.base_url, id))
            .send()
            .await
            .expect("Get album request failed")
    }

    /// GET /v1/library/song/{id}
    pub async fn get_song(&self, id: &str) -> Response {
        self.client
            .get(format!("{}/v1/library/song/{}", self.base_url, id))
            .send()
            .await
            .expect("Get song request failed")
    }

    // ========================================================================
    // Sync Endpoints
    // ========================================================================

    /// POST /v1/library/sync
    pub async fn sync_library(&self) -> Response {
        self.client
            .post(format!("{}/v1/library/sync", self.base_url))
            .send()
            .await
            .expect("Sync library request failed")
    }

    /// POST /v1/library/artist/{id}/sync
    pub async fn sync_artist(&self, id: &str) -> Response {
        self.client
            .post(format!("{}/v1/library/artist/{}/sync", self.base_url, id))
            .send()
            .await
            .expect("Sync artist request failed")
    }

    /// POST /v1/library/album/{id}/sync
    pub async fn sync_album(&self, id: &str) -> Response {
        self.client
            .post(format!("{}/v1/library/album/{}/sync", self.base_url, id))
            .send()
            .await
            .expect("Sync album request failed")
    }

    // ========================================================================
    // Rating Endpoints
    // ========================================================================

    /// PUT /v1/user/rating/{kind}/{id}
    pub async fn set_rating(&self, kind: &str, id: &str, value: i32, recommended: bool) -> Response {
        self.client
            .put(format!("{}/v1/user/rating/{}/{}", self.base_url, kind, id))
            .json(&json!({
                "value": value,
                "recommended": recommended
            }))
            .send()
            .await
            .expect("Set rating request failed")
    }

    /// GET /v1/user/rating/{kind}/{id}
    pub async fn get_rating(&self, kind: &str, id: &str) -> Response {
        self.client
            .get(format!("{}/v1/user/rating/{}/{}", self.base_url, kind, id))
            .send()
            .await
            .expect("Get rating request failed")
    }

    /// DELETE /v1/user/rating/{kind}/{id}
    pub async fn delete_rating(&self, kind: &str, id: &str) -> Response {
        self.client
            .delete(format!("{}/v1/user/rating/{}/{}", self.base_url, kind, id))
            .send()
            .await
            .expect("Delete rating request failed")
    }

    /// GET /v1/user/ratings[?kind={kind}]
    pub async fn get_ratings(&self, kind: Option<&str>) -> Response {
        let mut url = format!("{}/v1/user/ratings", self.base_url);
        if let Some(kind) = kind {
            url = format!("{}?kind={}", url, kind);
        }
        self.client
            .get(&url)
            .send()
            .await
            .expect("Get ratings request failed")
    }

    // ========================================================================
    // Favorite Endpoints
    // ========================================================================

    /// POST /v1/user/favorite/{kind}/{id}
    pub async fn add_favorite(&self, kind: &str, id: &str) -> Response {
        self.client
            .post(format!("{}/v1/user/favorite/{}/{}", self.base_url, kind, id))
            .send()
            .await
            .expect("Add favorite request failed")
    }

    /// DELETE /v1/user/favorite/{kind}/{id}
    pub async fn remove_favorite(&self, kind: &str, id: &str) -> Response {
        self.client
            .delete(format!("{}/v1/user/favorite/{}/{}", self.base_url, kind, id))
            .send()
            .await
            .expect("Remove favorite request failed")
    }

    /// GET /v1/user/favorites[?kind={kind}]
    pub async fn get_favorites(&self, kind: Option<&str>) -> Response {
        let mut url = format!("{}/v1/user/favorites", self.base_url);
        if let Some(kind) = kind {
            url = format!("{}?kind={}", url, kind);
        }
        self.client
            .get(&url)
            .send()
            .await
            .expect("Get favorites request failed")
    }

    // ========================================================================
    // Music Credentials Endpoints
    // ========================================================================

    /// POST /v1/user/music-auth (multipart credentials-file upload)
    pub async fn upload_music_auth(&self, content: &[u8]) -> Response {
        let part = reqwest::multipart::Part::bytes(content.to_vec()).file_name("auth.json");
        let form = reqwest::multipart::Form::new().part("auth_file", part);
        self.client
            .post(format!("{}/v1/user/music-auth", self.base_url))
            .multipart(form)
            .send()
            .await
            .expect("Upload music auth request failed")
    }

    /// GET /v1/user/music-auth
    pub async fn get_music_auth(&self) -> Response {
        self.client
            .get(format!("{}/v1/user/music-auth", self.base_url))
            .send()
            .await
            .expect("Get music auth request failed")
    }

    // ========================================================================
    // Downloads Endpoints
    // ========================================================================

    /// POST /v1/downloads
    pub async fn post_download(&self, url: &str) -> Response {
        self.client
            .post(format!("{}/v1/downloads", self.base_url))
            .json(&json!({ "url": url }))
            .send()
            .await
            .expect("Post download request failed")
    }

    /// GET /v1/downloads/queue
    pub async fn get_download_queue(&self) -> Response {
        self.client
            .get(format!("{}/v1/downloads/queue", self.base_url))
            .send()
            .await
            .expect("Get download queue request failed")
    }

    /// GET /v1/downloads/completed
    pub async fn get_downloads_completed(&self) -> Response {
        self.client
            .get(format!("{}/v1/downloads/completed", self.base_url))
            .send()
            .await
            .expect("Get completed downloads request failed")
    }

    /// GET /v1/downloads/completed/{id}
    pub async fn get_download_completed(&self, id: usize) -> Response {
        self.client
            .get(format!("{}/v1/downloads/completed/{}", self.base_url, id))
            .send()
            .await
            .expect("Get completed download request failed")
    }
}
