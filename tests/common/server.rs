//! Test server lifecycle management
//!
//! This module manages spawning and shutting down test HTTP servers.
//! Each test gets an isolated server with its own SQLite databases and
//! canned upstream services.

use super::constants::*;
use super::fixtures::{create_test_db_with_users, MockMusicService, MockVideoExtractor};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;
use ytm_mirror_server::downloads::{SqliteDownloadStore, VideoExtractor};
use ytm_mirror_server::library::SqliteLibraryStore;
use ytm_mirror_server::server::server::make_app;
use ytm_mirror_server::server::{RequestsLoggingLevel, ServerConfig};
use ytm_mirror_server::user::SqliteUserStore;

/// Test server instance with isolated databases
///
/// When dropped, the server gracefully shuts down and temp resources are
/// cleaned up.
pub struct TestServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    /// The port the server is listening on
    pub port: u16,

    /// User store for direct database access in tests
    pub user_store: Arc<SqliteUserStore>,

    /// Library store for direct database access in tests
    pub library_store: Arc<SqliteLibraryStore>,

    /// The canned music service, exposed for upstream-call-count assertions
    pub music_service: Arc<MockMusicService>,

    /// The canned extractor, exposed for call-count assertions
    pub extractor: Arc<MockVideoExtractor>,

    // Private fields - keep resources alive until drop
    _temp_db_dir: TempDir,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestServer {
    /// Spawns a new test server on a random port with the canned music
    /// service and extractor wired in
    pub async fn spawn() -> Self {
        Self::spawn_inner(true).await
    }

    /// Spawns a server with no extractor configured; downloads answer 503
    pub async fn spawn_without_extractor() -> Self {
        Self::spawn_inner(false).await
    }

    async fn spawn_inner(with_extractor: bool) -> Self {
        let (temp_db_dir, user_db_path) =
            create_test_db_with_users().expect("Failed to create test database");

        let user_store =
            Arc::new(SqliteUserStore::new(&user_db_path).expect("Failed to open user store"));
        let library_store = Arc::new(
            SqliteLibraryStore::new(temp_db_dir.path().join("library.db"))
                .expect("Failed to open library store"),
        );
        let download_store = Arc::new(
            SqliteDownloadStore::new(temp_db_dir.path().join("downloads.db"))
                .expect("Failed to open downloads store"),
        );

        let auth_files_dir = temp_db_dir.path().join("music_auth");
        std::fs::create_dir_all(&auth_files_dir).expect("Failed to create auth files dir");

        let music_service = Arc::new(MockMusicService::new());
        let extractor = Arc::new(MockVideoExtractor::new());

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");

        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();

        let base_url = format!("http://127.0.0.1:{}", port);

        // Create shutdown channel
        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        let config = ServerConfig {
            port,
            metrics_port: 0,
            requests_logging_level: RequestsLoggingLevel::None,
            frontend_dir_path: None,
            auth_files_dir,
        };

        let app = make_app(
            config,
            library_store.clone(),
            user_store.clone(),
            music_service.clone(),
            download_store,
            with_extractor.then(|| extractor.clone() as Arc<dyn VideoExtractor>),
        )
        .expect("Failed to build app");

        // Spawn server in background task with graceful shutdown
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Server failed");
        });

        let server = Self {
            base_url,
            port,
            user_store,
            library_store,
            music_service,
            extractor,
            _temp_db_dir: temp_db_dir,
            _shutdown_tx: Some(shutdown_tx),
        };

        server.wait_for_ready().await;

        server
    }

    /// Waits for the server to become ready by polling the home endpoint
    async fn wait_for_ready(&self) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("Failed to build reqwest client");

        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(SERVER_READY_TIMEOUT_MS);

        loop {
            if start.elapsed() > timeout {
                panic!(
                    "Server did not become ready within {}ms",
                    SERVER_READY_TIMEOUT_MS
                );
            }

            match client.get(format!("{}/", self.base_url)).send().await {
                Ok(response) if response.status().is_success() => {
                    return;
                }
                _ => {
                    tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
                }
            }
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        // Send shutdown signal
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
        // TempDir will be cleaned up automatically
    }
}
