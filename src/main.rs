use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

mod analysis;
mod cache;
mod config;
mod db;
mod dto;
mod error;
mod handlers;
mod models;
mod rate_limit;
mod services;
#[cfg(test)]
mod testkit;

use analysis::GatewayHandle;
use cache::JournalCache;
use config::Config;
use db::StoreHandle;
use rate_limit::RateLimitState;

#[derive(Clone)]
pub struct AppState {
    pub store: StoreHandle,
    pub cache: JournalCache,
    pub gateway: GatewayHandle,
    pub config: Arc<Config>,
    pub rate_limiter: RateLimitState,
}

fn cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = std::iter::once(config.frontend_url.as_str())
        .chain(config.cors_extra_origins.iter().map(String::as_str))
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(hv) => Some(hv),
            Err(_) => {
                tracing::warn!(origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
}

pub fn app(state: AppState) -> Router {
    // Endpoints that call the analysis model
    let model_routes = Router::new()
        .route("/api/analyze", post(handlers::analyze::analyze))
        .route(
            "/api/analytics/generate",
            post(handlers::analytics::generate_analytics),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit::rate_limit_analysis,
        ));

    let api_routes = Router::new()
        // Journals
        .route(
            "/api/journals",
            get(handlers::journals::get_journals).post(handlers::journals::save_journal),
        )
        // Analytics
        .route(
            "/api/analytics",
            get(handlers::analytics::get_analytics).post(handlers::analytics::save_analytics),
        )
        .route(
            "/api/analytics/latest",
            get(handlers::analytics::get_latest_analytics),
        );

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/readyz", get(handlers::health::readyz))
        .merge(api_routes)
        .merge(model_routes)
        .layer(cors_layer(&state.config))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "journal_insights_api=debug,tower_http=debug".into()),
        )
        .json()
        .init();

    let config = Arc::new(Config::from_env()?);

    let store = db::init_store_handle(&config).await;
    let cache = JournalCache::from_config(&config);
    let gateway = GatewayHandle::from_config(&config);
    tracing::info!(
        store = store.is_configured(),
        cache = cache.is_enabled(),
        analysis = gateway.is_configured(),
        "Dependencies initialized"
    );

    let rate_limiter = RateLimitState::new(config.analyze_rate_limit_per_min, Duration::from_secs(60));
    rate_limiter.spawn_cleanup();

    let state = AppState {
        store,
        cache,
        gateway,
        config: config.clone(),
        rate_limiter,
    };

    let addr = config.listen_addr();
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    // Client IP is needed for rate limiting
    axum::serve(
        listener,
        app(state).into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await?;

    Ok(())
}
