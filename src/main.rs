use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use booth_uploader::{
    app_state::AppState,
    config::AppConfig,
    routes,
    services::{
        compression::ImageCompressor, queue::UploadQueue, tracker::UploadTracker,
        transport::HttpTransport,
    },
};

#[tokio::main]
async fn main() {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    // Load configuration from environment
    let config = AppConfig::from_env().expect("Failed to load configuration from environment");

    tracing::info!("Initializing booth-uploader server");

    let prometheus_handle =
        routes::metrics::install_recorder().expect("Failed to install Prometheus metrics recorder");

    tracing::info!(api_base_url = %config.api_base_url, "Initializing booth API transport");
    let transport = HttpTransport::new(
        &config.api_base_url,
        config.api_token.clone(),
        config.http_timeout(),
    )
    .expect("Failed to initialize booth API client");

    let queue_config = config.queue_config();
    tracing::info!(
        max_concurrency = queue_config.max_concurrency,
        max_pending = ?queue_config.max_pending,
        "Starting photo upload queue"
    );
    let queue = UploadQueue::new(queue_config, ImageCompressor::default(), transport);

    let state = AppState::new(queue, UploadTracker::new(config.tracker_retention()));

    let app = routes::router(state)
        // Prometheus metrics endpoint (separate state)
        .route(
            "/metrics",
            get(routes::metrics::prometheus_metrics).with_state(prometheus_handle),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(DefaultBodyLimit::max(config.request_body_limit_bytes))
        .layer(RequestBodyLimitLayer::new(config.request_body_limit_bytes));

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await.expect("Server error");
}
