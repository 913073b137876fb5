use std::sync::Arc;

use axum::http::Method;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hyperskill_auth::JwtService;
use hyperskill_database::{create_pool, run_migrations, seed_admin, PgStore, Store};
use hyperskill_marketplace::{config::AppConfig, routes, services::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hyperskill_marketplace=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env();

    // Create database connection pool and run migrations
    let pool = create_pool(&config.database).await?;
    run_migrations(&pool).await?;

    // Build the storage backend and ensure the admin allow-list is seeded
    let store: Arc<dyn Store> = Arc::new(PgStore::new(pool));
    seed_admin(store.as_ref(), &config.admin.email, &config.admin.password).await?;

    // Create JWT service
    let jwt_service = JwtService::new(&config.jwt.secret);

    // Build application state
    let app_state = AppState {
        store,
        jwt_service,
        config: config.clone(),
    };

    // Build CORS layer
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any)
        .allow_origin(Any);

    // Build the application
    let app = routes::create_router(app_state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors),
    );

    // Start the server
    let listener =
        tokio::net::TcpListener::bind(format!("{}:{}", config.server.host, config.server.port))
            .await?;

    tracing::info!(
        "HyperSkill marketplace listening on {}:{}",
        config.server.host,
        config.server.port
    );

    axum::serve(listener, app).await?;

    Ok(())
}
