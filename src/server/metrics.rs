use axum::{http::StatusCode, response::IntoResponse};
use lazy_static::lazy_static;
use prometheus::{
    CounterVec, Encoder, GaugeVec, Histogram, HistogramOpts, HistogramVec, Opts, Registry,
    TextEncoder,
};
use std::time::Duration;

/// Metric name prefix for all mirror-server metrics
const PREFIX: &str = "ytm_mirror";

lazy_static! {
    // Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // HTTP Request Metrics
    pub static ref HTTP_REQUESTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_http_requests_total"), "Total number of HTTP requests"),
        &["method", "path", "status"]
    ).expect("Failed to create http_requests_total metric");

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            format!("{PREFIX}_http_request_duration_seconds"),
            "HTTP request duration in seconds"
        )
        .buckets(vec![0.001, 0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0]),
        &["method", "path"]
    ).expect("Failed to create http_request_duration_seconds metric");

    // Authentication Metrics
    pub static ref AUTH_LOGIN_ATTEMPTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_auth_login_attempts_total"), "Total login attempts"),
        &["status"]
    ).expect("Failed to create auth_login_attempts_total metric");

    pub static ref AUTH_LOGIN_DURATION_SECONDS: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            format!("{PREFIX}_auth_login_duration_seconds"),
            "Login request duration in seconds"
        )
        .buckets(vec![0.1, 0.5, 1.0, 2.0, 5.0, 10.0])
    ).expect("Failed to create auth_login_duration_seconds metric");

    // Sync Metrics
    pub static ref SYNC_OPERATIONS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_sync_operations_total"), "Sync operations by outcome"),
        &["operation", "status"]
    ).expect("Failed to create sync_operations_total metric");

    pub static ref SYNC_ROWS_CREATED_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_sync_rows_created_total"), "Rows created by sync passes"),
        &["entity"]
    ).expect("Failed to create sync_rows_created_total metric");

    // Library Metrics
    pub static ref LIBRARY_ITEMS_TOTAL: GaugeVec = GaugeVec::new(
        Opts::new(format!("{PREFIX}_library_items_total"), "Total items in the mirrored library"),
        &["type"]
    ).expect("Failed to create library_items_total metric");

    // Downloads Metrics
    pub static ref EXTRACTIONS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_extractions_total"), "Video metadata extractions by outcome"),
        &["status"]
    ).expect("Failed to create extractions_total metric");
}

/// Initialize all metrics and register them with the Prometheus registry
pub fn init_metrics() {
    // Register all metrics - ignore errors if already registered (for tests)
    let _ = REGISTRY.register(Box::new(HTTP_REQUESTS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()));
    let _ = REGISTRY.register(Box::new(AUTH_LOGIN_ATTEMPTS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(AUTH_LOGIN_DURATION_SECONDS.clone()));
    let _ = REGISTRY.register(Box::new(SYNC_OPERATIONS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(SYNC_ROWS_CREATED_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(LIBRARY_ITEMS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(EXTRACTIONS_TOTAL.clone()));

    tracing::info!("Metrics system initialized successfully");
}

/// Initialize library size gauges from the store counts
pub fn init_library_metrics(num_artists: usize, num_albums: usize, num_songs: usize) {
    set_library_items(num_artists, num_albums, num_songs);

    tracing::info!(
        "Library metrics initialized: {} artists, {} albums, {} songs",
        num_artists,
        num_albums,
        num_songs
    );
}

/// Update the library size gauges
pub fn set_library_items(num_artists: usize, num_albums: usize, num_songs: usize) {
    LIBRARY_ITEMS_TOTAL
        .with_label_values(&["artist"])
        .set(num_artists as f64);

    LIBRARY_ITEMS_TOTAL
        .with_label_values(&["album"])
        .set(num_albums as f64);

    LIBRARY_ITEMS_TOTAL
        .with_label_values(&["song"])
        .set(num_songs as f64);
}

/// Record an HTTP request
pub fn record_http_request(method: &str, path: &str, status: u16, duration: Duration) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status.to_string()])
        .inc();

    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path])
        .observe(duration.as_secs_f64());
}

/// Record a login attempt
pub fn record_login_attempt(status: &str, duration: Duration) {
    AUTH_LOGIN_ATTEMPTS_TOTAL.with_label_values(&[status]).inc();

    AUTH_LOGIN_DURATION_SECONDS.observe(duration.as_secs_f64());
}

/// Record a sync operation outcome
pub fn record_sync_operation(operation: &str, status: &str) {
    SYNC_OPERATIONS_TOTAL
        .with_label_values(&[operation, status])
        .inc();
}

/// Record rows created by a sync pass
pub fn record_sync_created(artists: usize, albums: usize, songs: usize) {
    SYNC_ROWS_CREATED_TOTAL
        .with_label_values(&["artist"])
        .inc_by(artists as f64);
    SYNC_ROWS_CREATED_TOTAL
        .with_label_values(&["album"])
        .inc_by(albums as f64);
    SYNC_ROWS_CREATED_TOTAL
        .with_label_values(&["song"])
        .inc_by(songs as f64);
}

/// Record a metadata extraction outcome
pub fn record_extraction(status: &str) {
    EXTRACTIONS_TOTAL.with_label_values(&[status]).inc();
}

/// Handler for the /metrics endpoint
pub async fn metrics_handler() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();

    let mut buffer = vec![];
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(()) => {
            let response = String::from_utf8(buffer).unwrap_or_else(|_| String::from(""));
            (StatusCode::OK, response)
        }
        Err(e) => {
            tracing::error!("Failed to encode metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to encode metrics: {}", e),
            )
        }
    }
}
