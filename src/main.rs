use axum::{
    routing::{get, post},
    Router,
};
use axum_prometheus::PrometheusMetricLayer;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

use web_bookmark::config::Config;
use web_bookmark::handlers;
use web_bookmark::state::AppState;

#[tokio::main]
async fn main() {
    // Initialize tracing — JSON in production, human-readable in dev.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "web_bookmark=info,tower_http=info".parse().unwrap());

    if std::env::var("APP_ENV").as_deref() == Ok("production") {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    info!("🔖 Web bookmark server starting...");

    // Load configuration — fatal if JWT_SECRET is missing or too short.
    let config = Config::from_env().expect("Failed to load configuration");
    info!(
        timeout_secs = config.fetch_timeout.as_secs(),
        favicon_fallback = %config.favicon_fallback,
        allow_private_hosts = config.allow_private_hosts,
        "📝 Configuration loaded"
    );

    if config.allow_private_hosts {
        tracing::warn!("⚠️ ALLOW_PRIVATE_HOSTS is set: the fetch endpoint can reach internal addresses");
    }

    // CORS: permissive in dev, restrictive in production.
    let cors = if config.is_dev {
        info!("🔓 CORS: permissive (dev mode)");
        CorsLayer::permissive()
    } else {
        info!("🔒 CORS: restrictive (production mode)");
        CorsLayer::new()
    };

    let addr = config.server_addr();
    let app_state = AppState::from_config(&config).expect("Failed to build HTTP client");

    // Prometheus metrics layer
    let (prometheus_layer, metric_handle) = PrometheusMetricLayer::pair();

    // Build router
    let app = Router::new()
        // Health check + metrics
        .route("/health", get(handlers::health_check))
        .route(
            "/metrics",
            get(move || async move { metric_handle.render() }),
        )
        // Metadata fetch endpoint (protected)
        .route(
            "/web-bookmark-block/v1/fetch",
            get(handlers::fetch::fetch_page),
        )
        // Card rendering
        .route(
            "/web-bookmark-block/v1/render/saved",
            post(handlers::render::render_saved_card),
        )
        .route(
            "/web-bookmark-block/v1/render/preview",
            post(handlers::render::render_preview_card),
        )
        // Attribute updates and server-side resolution
        .route(
            "/web-bookmark-block/v1/resolve",
            post(handlers::resolve::resolve_bookmark),
        )
        .route(
            "/web-bookmark-block/v1/attributes",
            post(handlers::resolve::update_attributes),
        )
        .fallback(handlers::not_found)
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(prometheus_layer)
        .layer(cors)
        .with_state(app_state);

    // Start server
    info!("🎧 Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .await
        .expect("Server failed to start");
}
