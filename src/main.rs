use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ytm_mirror_server::downloads::{HttpExtractorClient, SqliteDownloadStore, VideoExtractor};
use ytm_mirror_server::library::{LibraryStore, SqliteLibraryStore};
use ytm_mirror_server::music_api::{HttpMusicService, DEFAULT_MUSIC_API_URL};
use ytm_mirror_server::server::{metrics, run_server, RequestsLoggingLevel};
use ytm_mirror_server::user::SqliteUserStore;

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to the SQLite library database file (the mirrored catalog).
    #[clap(value_parser = parse_path)]
    pub library_db: PathBuf,

    /// Path to the SQLite database file to use for user storage.
    #[clap(value_parser = parse_path)]
    pub user_db: PathBuf,

    /// Path to the SQLite downloads database file.
    #[clap(value_parser = parse_path)]
    pub downloads_db: PathBuf,

    /// Directory for uploaded music-service credentials files.
    /// Defaults to a `music_auth` directory next to the user database.
    #[clap(long, value_parser = parse_path)]
    pub auth_files_dir: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 3001)]
    pub port: u16,

    /// The port for the metrics server (Prometheus scraping).
    #[clap(long, default_value_t = 9091)]
    pub metrics_port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// Path to the frontend directory to be statically served.
    #[clap(long)]
    pub frontend_dir_path: Option<String>,

    /// Base URL of the music-service API.
    #[clap(long, default_value = DEFAULT_MUSIC_API_URL)]
    pub music_api_url: String,

    /// Timeout in seconds for music-service requests.
    #[clap(long, default_value_t = 30)]
    pub music_api_timeout_sec: u64,

    /// URL of the video-extractor service. Downloads answer 503 when unset.
    #[clap(long)]
    pub extractor_url: Option<String>,

    /// Timeout in seconds for extractor requests.
    #[clap(long, default_value_t = 300)]
    pub extractor_timeout_sec: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .unwrap();

    // Default the credentials directory to a sibling of the user db
    let auth_files_dir = match cli_args.auth_files_dir {
        Some(path) => path,
        None => cli_args
            .user_db
            .parent()
            .map(|p| p.join("music_auth"))
            .unwrap_or_else(|| PathBuf::from("music_auth")),
    };
    std::fs::create_dir_all(&auth_files_dir)
        .with_context(|| format!("Error creating auth files dir {:?}", auth_files_dir))?;

    info!("Opening SQLite library database at {:?}...", cli_args.library_db);
    let library_store = Arc::new(SqliteLibraryStore::new(&cli_args.library_db)?);

    info!("Initializing metrics...");
    metrics::init_metrics();
    metrics::init_library_metrics(
        library_store.get_artists_count(),
        library_store.get_albums_count(),
        library_store.get_songs_count(),
    );

    let user_store = Arc::new(SqliteUserStore::new(&cli_args.user_db)?);
    let download_store = Arc::new(SqliteDownloadStore::new(&cli_args.downloads_db)?);

    let music_service = Arc::new(HttpMusicService::new(
        cli_args.music_api_url,
        cli_args.music_api_timeout_sec,
    ));

    let extractor: Option<Arc<dyn VideoExtractor>> = cli_args.extractor_url.map(|url| {
        info!("Extractor service configured at {}", url);
        Arc::new(HttpExtractorClient::new(url, cli_args.extractor_timeout_sec))
            as Arc<dyn VideoExtractor>
    });

    info!("Ready to serve at port {}!", cli_args.port);
    info!("Metrics available at port {}!", cli_args.metrics_port);
    run_server(
        library_store,
        user_store,
        music_service,
        download_store,
        extractor,
        cli_args.logging_level,
        cli_args.port,
        cli_args.metrics_port,
        cli_args.frontend_dir_path,
        auth_files_dir,
    )
    .await
}
