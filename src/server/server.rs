use anyhow::Result;
use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use tracing::{debug, error};

use crate::downloads::DownloadStore;
use crate::library::LibraryStore;
use crate::music_api::{MusicApiError, MusicAuth, MusicService};
use crate::sync::{SyncEngine, SyncError};
use crate::user::{
    user_models::rating_in_range, AuthToken, AuthTokenValue, ContentKind, UserStore,
};
use axum_extra::extract::cookie::{Cookie, SameSite};
use tower_http::services::ServeDir;

use axum::{
    body::Body,
    extract::{Multipart, Path, Query, State},
    http::{response, HeaderValue, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::metrics;
use super::session::Session;
use super::{log_requests, state::*, RequestsLoggingLevel, ServerConfig};

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub hash: String,
    pub session_token: Option<String>,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

#[derive(Deserialize, Debug)]
struct LoginBody {
    pub user_handle: String,
    pub password: String,
}

#[derive(Serialize)]
struct LoginSuccessResponse {
    token: String,
}

#[derive(Deserialize, Debug)]
struct SetRatingBody {
    pub value: i32,
    #[serde(default)]
    pub recommended: bool,
}

#[derive(Deserialize, Debug)]
struct DownloadBody {
    pub url: String,
}

#[derive(Deserialize)]
struct KindFilterQuery {
    kind: Option<String>,
}

async fn home(session: Option<Session>, State(state): State<ServerState>) -> impl IntoResponse {
    let stats = ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        hash: state.hash.clone(),
        session_token: session.map(|s| s.token),
    };
    Json(stats)
}

// =============================================================================
// Auth
// =============================================================================

async fn login(State(user_store): State<GuardedUserStore>, Json(body): Json<LoginBody>) -> Response {
    debug!("login() called for {}", body.user_handle);
    let start = Instant::now();

    let credentials = match user_store.get_user_auth_credentials(&body.user_handle) {
        Ok(Some(credentials)) => credentials,
        Ok(None) => {
            metrics::record_login_attempt("failure", start.elapsed());
            return StatusCode::FORBIDDEN.into_response();
        }
        Err(err) => {
            error!("Error reading credentials: {}", err);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let password_credentials = match &credentials.username_password {
        Some(x) => x,
        None => {
            metrics::record_login_attempt("failure", start.elapsed());
            return StatusCode::FORBIDDEN.into_response();
        }
    };

    match password_credentials
        .hasher
        .verify(&body.password, &password_credentials.hash)
    {
        Ok(true) => {}
        Ok(false) => {
            metrics::record_login_attempt("failure", start.elapsed());
            return StatusCode::FORBIDDEN.into_response();
        }
        Err(err) => {
            error!("Error verifying password: {}", err);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    }

    let auth_token = AuthToken {
        user_id: credentials.user_id,
        created: std::time::SystemTime::now(),
        last_used: None,
        value: AuthTokenValue::generate(),
    };
    if let Err(err) = user_store.add_user_auth_token(auth_token.clone()) {
        error!("Error with auth token generation: {}", err);
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    metrics::record_login_attempt("success", start.elapsed());

    let response_body = LoginSuccessResponse {
        token: auth_token.value.0.clone(),
    };
    let response_body = serde_json::to_string(&response_body).unwrap();

    let cookie_value = HeaderValue::from_str(&format!(
        "session_token={}; Path=/; HttpOnly",
        auth_token.value.0
    ))
    .unwrap();
    response::Builder::new()
        .status(StatusCode::CREATED)
        .header(axum::http::header::SET_COOKIE, cookie_value)
        .body(Body::from(response_body))
        .unwrap()
}

async fn logout(State(user_store): State<GuardedUserStore>, session: Session) -> Response {
    match user_store.delete_user_auth_token(&AuthTokenValue(session.token)) {
        Ok(_) => {
            let cookie_value = Cookie::build(Cookie::new("session_token", ""))
                .path("/")
                .expires(time::OffsetDateTime::now_utc() - time::Duration::days(1)) // Expire it in the past
                .same_site(SameSite::Lax)
                .build();

            response::Builder::new()
                .status(StatusCode::OK)
                .header(axum::http::header::SET_COOKIE, cookie_value.to_string())
                .body(Body::empty())
                .unwrap()
        }
        Err(_) => StatusCode::BAD_REQUEST.into_response(),
    }
}

// =============================================================================
// Library
// =============================================================================

async fn get_artists(
    _session: Session,
    State(library): State<GuardedLibraryStore>,
) -> Response {
    match library.list_artists() {
        Ok(artists) => Json(artists).into_response(),
        Err(err) => {
            error!("Error listing artists: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn get_artist(
    _session: Session,
    State(library): State<GuardedLibraryStore>,
    Path(id): Path<String>,
) -> Response {
    match library.get_resolved_artist(&id) {
        Ok(Some(artist)) => Json(artist).into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, format!("{}", err)).into_response(),
    }
}

async fn get_album(
    _session: Session,
    State(library): State<GuardedLibraryStore>,
    Path(id): Path<String>,
) -> Response {
    match library.get_resolved_album(&id) {
        Ok(Some(album)) => Json(album).into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, format!("{}", err)).into_response(),
    }
}

async fn get_song(
    _session: Session,
    State(library): State<GuardedLibraryStore>,
    Path(id): Path<String>,
) -> Response {
    match library.get_song(&id) {
        Ok(Some(song)) => Json(song).into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, format!("{}", err)).into_response(),
    }
}

// =============================================================================
// Sync
// =============================================================================

fn credentials_missing_response() -> Response {
    // The JSON analog of the original redirect to the credentials setup page
    (
        StatusCode::CONFLICT,
        Json(serde_json::json!({
            "error": "music service credentials are not configured",
            "setup": "/v1/user/music-auth",
        })),
    )
        .into_response()
}

/// Loads the caller's registered music-service credentials, or produces the
/// response the handler should answer with.
fn music_auth_for(state: &ServerState, user_id: usize) -> Result<MusicAuth, Response> {
    let record = match state.user_store.get_music_auth(user_id) {
        Ok(Some(record)) => record,
        Ok(None) => return Err(credentials_missing_response()),
        Err(err) => {
            error!("Error reading music auth record: {}", err);
            return Err(StatusCode::INTERNAL_SERVER_ERROR.into_response());
        }
    };
    MusicAuth::load(user_id, &record.auth_file).map_err(|_| credentials_missing_response())
}

fn sync_error_response(operation: &str, err: SyncError) -> Response {
    metrics::record_sync_operation(operation, "error");
    match err {
        SyncError::Api(MusicApiError::CredentialsMissing) => credentials_missing_response(),
        SyncError::UnknownArtist(_) | SyncError::UnknownAlbum(_) => {
            (StatusCode::NOT_FOUND, err.to_string()).into_response()
        }
        other => {
            error!("Sync failed: {}", other);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

fn refresh_library_metrics(library: &dyn LibraryStore) {
    metrics::set_library_items(
        library.get_artists_count(),
        library.get_albums_count(),
        library.get_songs_count(),
    );
}

async fn post_sync_library(session: Session, State(state): State<ServerState>) -> Response {
    let auth = match music_auth_for(&state, session.user_id) {
        Ok(auth) => auth,
        Err(response) => return response,
    };

    match state.sync_engine.sync_library(&auth).await {
        Ok(report) => {
            metrics::record_sync_operation("library", "ok");
            metrics::record_sync_created(
                report.artists_created,
                report.albums_created,
                report.songs_created,
            );
            refresh_library_metrics(state.library_store.as_ref());
            Json(report).into_response()
        }
        Err(err) => sync_error_response("library", err),
    }
}

async fn post_sync_artist(
    session: Session,
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Response {
    let auth = match music_auth_for(&state, session.user_id) {
        Ok(auth) => auth,
        Err(response) => return response,
    };

    match state.sync_engine.sync_discography(&auth, &id).await {
        Ok(albums_created) => {
            metrics::record_sync_operation("discography", "ok");
            metrics::record_sync_created(0, albums_created, 0);
            refresh_library_metrics(state.library_store.as_ref());
            Json(serde_json::json!({ "albums_created": albums_created })).into_response()
        }
        Err(err) => sync_error_response("discography", err),
    }
}

async fn post_sync_album(
    session: Session,
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Response {
    let auth = match music_auth_for(&state, session.user_id) {
        Ok(auth) => auth,
        Err(response) => return response,
    };

    match state.sync_engine.sync_album_tracks(&auth, &id).await {
        Ok(songs_created) => {
            metrics::record_sync_operation("tracks", "ok");
            metrics::record_sync_created(0, 0, songs_created);
            refresh_library_metrics(state.library_store.as_ref());
            Json(serde_json::json!({ "songs_created": songs_created })).into_response()
        }
        Err(err) => sync_error_response("tracks", err),
    }
}

// =============================================================================
// Ratings & favorites
// =============================================================================

fn parse_kind(kind: &str) -> Result<ContentKind, Response> {
    kind.parse()
        .map_err(|_| (StatusCode::BAD_REQUEST, format!("Unknown content kind {}", kind)).into_response())
}

fn parse_kind_filter(query: &KindFilterQuery) -> Result<Option<ContentKind>, Response> {
    match &query.kind {
        Some(kind) => parse_kind(kind).map(Some),
        None => Ok(None),
    }
}

async fn put_rating(
    session: Session,
    State(user_store): State<GuardedUserStore>,
    Path((kind, content_id)): Path<(String, String)>,
    Json(body): Json<SetRatingBody>,
) -> Response {
    let kind = match parse_kind(&kind) {
        Ok(kind) => kind,
        Err(response) => return response,
    };
    if !rating_in_range(body.value) {
        return (
            StatusCode::BAD_REQUEST,
            format!("Rating {} out of range", body.value),
        )
            .into_response();
    }

    match user_store.set_rating(
        session.user_id,
        kind,
        &content_id,
        body.value,
        body.recommended,
    ) {
        Ok(()) => StatusCode::OK.into_response(),
        Err(err) => {
            error!("Error setting rating: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn get_rating(
    session: Session,
    State(user_store): State<GuardedUserStore>,
    Path((kind, content_id)): Path<(String, String)>,
) -> Response {
    let kind = match parse_kind(&kind) {
        Ok(kind) => kind,
        Err(response) => return response,
    };

    let rating = match user_store.get_rating(session.user_id, kind, &content_id) {
        Ok(rating) => rating,
        Err(err) => {
            error!("Error reading rating: {}", err);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };
    let average = match user_store.average_rating(kind, &content_id) {
        Ok(average) => average,
        Err(err) => {
            error!("Error reading average rating: {}", err);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };
    Json(serde_json::json!({ "rating": rating, "average": average })).into_response()
}

async fn delete_rating(
    session: Session,
    State(user_store): State<GuardedUserStore>,
    Path((kind, content_id)): Path<(String, String)>,
) -> Response {
    let kind = match parse_kind(&kind) {
        Ok(kind) => kind,
        Err(response) => return response,
    };
    match user_store.delete_rating(session.user_id, kind, &content_id) {
        Ok(()) => StatusCode::OK.into_response(),
        Err(err) => {
            error!("Error deleting rating: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn get_ratings(
    session: Session,
    State(user_store): State<GuardedUserStore>,
    Query(query): Query<KindFilterQuery>,
) -> Response {
    let kind = match parse_kind_filter(&query) {
        Ok(kind) => kind,
        Err(response) => return response,
    };
    match user_store.list_ratings(session.user_id, kind) {
        Ok(ratings) => Json(ratings).into_response(),
        Err(err) => {
            error!("Error listing ratings: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn post_favorite(
    session: Session,
    State(user_store): State<GuardedUserStore>,
    Path((kind, content_id)): Path<(String, String)>,
) -> Response {
    let kind = match parse_kind(&kind) {
        Ok(kind) => kind,
        Err(response) => return response,
    };
    match user_store.add_favorite(session.user_id, kind, &content_id) {
        Ok(()) => StatusCode::OK.into_response(),
        Err(err) => {
            error!("Error adding favorite: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn delete_favorite(
    session: Session,
    State(user_store): State<GuardedUserStore>,
    Path((kind, content_id)): Path<(String, String)>,
) -> Response {
    let kind = match parse_kind(&kind) {
        Ok(kind) => kind,
        Err(response) => return response,
    };
    match user_store.remove_favorite(session.user_id, kind, &content_id) {
        Ok(()) => StatusCode::OK.into_response(),
        Err(err) => {
            error!("Error removing favorite: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn get_favorites(
    session: Session,
    State(user_store): State<GuardedUserStore>,
    Query(query): Query<KindFilterQuery>,
) -> Response {
    let kind = match parse_kind_filter(&query) {
        Ok(kind) => kind,
        Err(response) => return response,
    };
    match user_store.list_favorites(session.user_id, kind) {
        Ok(favorites) => Json(favorites).into_response(),
        Err(err) => {
            error!("Error listing favorites: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

// =============================================================================
// Music service credentials
// =============================================================================

async fn post_music_auth(
    session: Session,
    State(state): State<ServerState>,
    mut multipart: Multipart,
) -> Response {
    let bytes = match multipart.next_field().await {
        Ok(Some(field)) => match field.bytes().await {
            Ok(bytes) => bytes,
            Err(err) => {
                return (StatusCode::BAD_REQUEST, format!("Unreadable upload: {}", err))
                    .into_response()
            }
        },
        Ok(None) => {
            return (StatusCode::BAD_REQUEST, "No credentials file in upload").into_response()
        }
        Err(err) => {
            return (StatusCode::BAD_REQUEST, format!("Malformed multipart: {}", err))
                .into_response()
        }
    };

    let path = state
        .config
        .auth_files_dir
        .join(format!("{}.json", session.user_id));
    if let Err(err) = std::fs::write(&path, &bytes) {
        error!("Error writing credentials file {:?}: {}", path, err);
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    // The upload must contain usable credentials before it is registered
    if MusicAuth::load(session.user_id, &path).is_err() {
        let _ = std::fs::remove_file(&path);
        return (StatusCode::BAD_REQUEST, "Not a valid credentials file").into_response();
    }

    match state
        .user_store
        .set_music_auth(session.user_id, &path.to_string_lossy())
    {
        Ok(()) => StatusCode::CREATED.into_response(),
        Err(err) => {
            error!("Error registering credentials file: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn get_music_auth(session: Session, State(user_store): State<GuardedUserStore>) -> Response {
    match user_store.get_music_auth(session.user_id) {
        Ok(record) => Json(serde_json::json!({
            "configured": record.is_some(),
            "updated": record.map(|r| r.updated),
        }))
        .into_response(),
        Err(err) => {
            error!("Error reading music auth record: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

// =============================================================================
// Downloads
// =============================================================================

async fn post_download(
    session: Session,
    State(state): State<ServerState>,
    Json(body): Json<DownloadBody>,
) -> Response {
    let extractor = match &state.extractor {
        Some(extractor) => extractor.clone(),
        None => {
            return (StatusCode::SERVICE_UNAVAILABLE, "No extractor configured").into_response()
        }
    };

    let request_id = match state.download_store.enqueue(session.user_id, &body.url) {
        Ok(id) => id,
        Err(err) => {
            error!("Error enqueueing download: {}", err);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    // Extraction runs inside the request; a failure leaves the queue row
    // unfinished and answers 500.
    let metadata = match extractor.extract(&body.url).await {
        Ok(metadata) => metadata,
        Err(err) => {
            metrics::record_extraction("error");
            error!("Extraction of {} failed: {}", body.url, err);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let completed_id = match state.download_store.add_completed(session.user_id, &metadata) {
        Ok(id) => id,
        Err(err) => {
            error!("Error recording completed extraction: {}", err);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };
    if let Err(err) = state.download_store.mark_finished(request_id) {
        error!("Error stamping queue row {}: {}", request_id, err);
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    metrics::record_extraction("ok");
    match state.download_store.get_completed(completed_id) {
        Ok(Some(file)) => (StatusCode::CREATED, Json(file)).into_response(),
        Ok(None) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        Err(err) => {
            error!("Error reading completed extraction: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn get_download_queue(
    session: Session,
    State(download_store): State<GuardedDownloadStore>,
) -> Response {
    match download_store.list_queue(session.user_id) {
        Ok(queue) => Json(queue).into_response(),
        Err(err) => {
            error!("Error listing download queue: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn get_downloads_completed(
    session: Session,
    State(download_store): State<GuardedDownloadStore>,
) -> Response {
    match download_store.list_completed(session.user_id) {
        Ok(files) => Json(files).into_response(),
        Err(err) => {
            error!("Error listing completed downloads: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn get_download_completed(
    session: Session,
    State(download_store): State<GuardedDownloadStore>,
    Path(id): Path<usize>,
) -> Response {
    match download_store.get_completed(id) {
        // Rows are per-user; someone else's row is indistinguishable from a
        // missing one.
        Ok(Some(file)) if file.user_id == session.user_id => Json(file).into_response(),
        Ok(_) => StatusCode::NOT_FOUND.into_response(),
        Err(err) => {
            error!("Error reading completed download: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

// =============================================================================
// App assembly
// =============================================================================

impl ServerState {
    fn new(
        config: ServerConfig,
        library_store: GuardedLibraryStore,
        user_store: GuardedUserStore,
        sync_engine: GuardedSyncEngine,
        download_store: GuardedDownloadStore,
        extractor: OptionalExtractor,
    ) -> ServerState {
        ServerState {
            config,
            start_time: Instant::now(),
            library_store,
            user_store,
            sync_engine,
            download_store,
            extractor,
            hash: env!("GIT_HASH").to_owned(),
        }
    }
}

pub fn make_app(
    config: ServerConfig,
    library_store: Arc<dyn LibraryStore>,
    user_store: Arc<dyn UserStore>,
    music_service: Arc<dyn MusicService>,
    download_store: Arc<dyn DownloadStore>,
    extractor: Option<Arc<dyn crate::downloads::VideoExtractor>>,
) -> Result<Router> {
    let sync_engine = Arc::new(SyncEngine::new(library_store.clone(), music_service));
    let state = ServerState::new(
        config.clone(),
        library_store,
        user_store,
        sync_engine,
        download_store,
        extractor,
    );

    let auth_routes: Router = Router::new()
        .route("/login", post(login))
        .route("/logout", get(logout))
        .with_state(state.clone());

    let library_routes: Router = Router::new()
        .route("/artists", get(get_artists))
        .route("/artist/{id}", get(get_artist))
        .route("/album/{id}", get(get_album))
        .route("/song/{id}", get(get_song))
        .route("/sync", post(post_sync_library))
        .route("/artist/{id}/sync", post(post_sync_artist))
        .route("/album/{id}/sync", post(post_sync_album))
        .with_state(state.clone());

    let user_routes: Router = Router::new()
        .route("/rating/{kind}/{id}", put(put_rating))
        .route("/rating/{kind}/{id}", get(get_rating))
        .route("/rating/{kind}/{id}", delete(delete_rating))
        .route("/ratings", get(get_ratings))
        .route("/favorite/{kind}/{id}", post(post_favorite))
        .route("/favorite/{kind}/{id}", delete(delete_favorite))
        .route("/favorites", get(get_favorites))
        .route("/music-auth", post(post_music_auth))
        .route("/music-auth", get(get_music_auth))
        .with_state(state.clone());

    let downloads_routes: Router = Router::new()
        .route("/", post(post_download))
        .route("/queue", get(get_download_queue))
        .route("/completed", get(get_downloads_completed))
        .route("/completed/{id}", get(get_download_completed))
        .with_state(state.clone());

    let home_router: Router = match &config.frontend_dir_path {
        Some(frontend_path) => {
            let static_files_service =
                ServeDir::new(frontend_path).append_index_html_on_directories(true);
            Router::new().fallback_service(static_files_service)
        }
        None => Router::new()
            .route("/", get(home))
            .with_state(state.clone()),
    };

    let app: Router = home_router
        .nest("/v1/auth", auth_routes)
        .nest("/v1/library", library_routes)
        .nest("/v1/user", user_routes)
        .nest("/v1/downloads", downloads_routes)
        .layer(middleware::from_fn_with_state(state, log_requests));

    Ok(app)
}

#[allow(clippy::too_many_arguments)]
pub async fn run_server(
    library_store: Arc<dyn LibraryStore>,
    user_store: Arc<dyn UserStore>,
    music_service: Arc<dyn MusicService>,
    download_store: Arc<dyn DownloadStore>,
    extractor: Option<Arc<dyn crate::downloads::VideoExtractor>>,
    requests_logging_level: RequestsLoggingLevel,
    port: u16,
    metrics_port: u16,
    frontend_dir_path: Option<String>,
    auth_files_dir: std::path::PathBuf,
) -> Result<()> {
    let config = ServerConfig {
        port,
        metrics_port,
        requests_logging_level,
        frontend_dir_path,
        auth_files_dir,
    };
    let app = make_app(
        config,
        library_store,
        user_store,
        music_service,
        download_store,
        extractor,
    )?;

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port))
        .await
        .unwrap();

    // Prometheus scraping gets its own port, away from the public surface
    let metrics_app: Router = Router::new().route("/metrics", get(metrics::metrics_handler));
    let metrics_listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", metrics_port))
        .await
        .unwrap();

    tokio::select! {
        result = axum::serve(listener, app) => Ok(result?),
        result = axum::serve(metrics_listener, metrics_app) => Ok(result?),
    }
}
