use axum::{
    routing::{get, post},
    Router,
};
use sqlx::sqlite::SqlitePool;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod state;

use archimap_backend::config;
use archimap_backend::db;
use archimap_backend::repo::{make_repository, SchemaGeneration};
use archimap_backend::search::{SearchHistory, SearchService};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "archimap_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration and publish the global instance / 設定を読み込み
    let app_config = config::init_config()
        .expect("Failed to load configuration")
        .read()
        .clone();
    tracing::info!(
        "Server will listen on {}:{}",
        app_config.server.host,
        app_config.server.port
    );

    // Create data directory if not exists / データディレクトリを作成
    let data_dir = app_config.get_data_dir();
    if !data_dir.exists() {
        std::fs::create_dir_all(&data_dir)?;
        tracing::info!("Created data directory: {:?}", data_dir);
    }

    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| app_config.get_database_url());

    let pool = SqlitePool::connect(&database_url).await?;

    // Probe the schema generation BEFORE migrating: a legacy database
    // stays legacy and is served through the legacy repository.
    let generation = SchemaGeneration::probe(&pool).await?;
    match generation {
        SchemaGeneration::Normalized => db::run_migrations(&pool).await?,
        SchemaGeneration::Legacy => db::ensure_history_table(&pool).await?,
    }
    tracing::info!("Storage schema generation: {:?}", generation);

    let repo = make_repository(pool.clone(), generation);
    let service = SearchService::new(repo);
    let history = Arc::new(SearchHistory::new(app_config.search.history_ttl_minutes));

    let state = Arc::new(AppState {
        db: pool,
        generation,
        service,
        history,
    });

    let app = Router::new()
        .route("/api/health", get(api::server::health_check))
        .route("/api/status", get(api::server::get_server_status))
        .route("/api/search", post(api::search::search))
        .route("/api/search/multi", post(api::search::search_multi))
        .route("/api/search/location", post(api::search::search_location))
        .route("/api/search/popular", get(api::search::popular_searches))
        .route("/api/architects/:slug/buildings", get(api::search::architect_buildings))
        .route("/api/buildings/recent", get(api::buildings::recent_buildings))
        .route("/api/buildings/:slug", get(api::buildings::building_by_slug))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let bind_addr = app_config.get_bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    tracing::info!("Server running at http://{}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
