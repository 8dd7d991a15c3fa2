use axum::extract::FromRef;

use crate::downloads::{DownloadStore, VideoExtractor};
use crate::library::LibraryStore;
use crate::sync::SyncEngine;
use crate::user::UserStore;
use std::sync::Arc;
use std::time::Instant;

use super::ServerConfig;

pub type GuardedLibraryStore = Arc<dyn LibraryStore>;
pub type GuardedUserStore = Arc<dyn UserStore>;
pub type GuardedSyncEngine = Arc<SyncEngine>;
pub type GuardedDownloadStore = Arc<dyn DownloadStore>;
pub type OptionalExtractor = Option<Arc<dyn VideoExtractor>>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub library_store: GuardedLibraryStore,
    pub user_store: GuardedUserStore,
    pub sync_engine: GuardedSyncEngine,
    pub download_store: GuardedDownloadStore,
    pub extractor: OptionalExtractor,
    pub hash: String,
}

impl FromRef<ServerState> for GuardedLibraryStore {
    fn from_ref(input: &ServerState) -> Self {
        input.library_store.clone()
    }
}

impl FromRef<ServerState> for GuardedUserStore {
    fn from_ref(input: &ServerState) -> Self {
        input.user_store.clone()
    }
}

impl FromRef<ServerState> for GuardedSyncEngine {
    fn from_ref(input: &ServerState) -> Self {
        input.sync_engine.clone()
    }
}

impl FromRef<ServerState> for GuardedDownloadStore {
    fn from_ref(input: &ServerState) -> Self {
        input.download_store.clone()
    }
}

impl FromRef<ServerState> for OptionalExtractor {
    fn from_ref(input: &ServerState) -> Self {
        input.extractor.clone()
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}
