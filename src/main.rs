//! ShelfShare Server - Book Sharing Platform

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shelfshare_server::{
    api, config::AppConfig, repository::Repository, services::Services, AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load().expect("Failed to load configuration");

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("shelfshare_server={},tower_http=debug", config.logging.level).into()
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting ShelfShare Server v{}", env!("CARGO_PKG_VERSION"));

    // Create database connection pool
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect(&config.database.url)
        .await
        .expect("Failed to connect to database");

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run database migrations");

    tracing::info!("Database migrations completed");

    // Save server address before moving config
    let server_host = config.server.host.clone();
    let server_port = config.server.port;

    // Create repository and services
    let repository = Repository::new(pool);
    let services = Services::new(
        repository,
        config.auth.clone(),
        config.email.clone(),
        config.server.frontend_url.clone(),
    );

    // Create application state
    let state = AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(
        server_host.parse().expect("Invalid host address"),
        server_port,
    );

    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes
fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // API v1 routes
    let api_v1 = Router::new()
        // Health check
        .route("/health", get(api::health::health_check))
        .route("/ready", get(api::health::readiness_check))
        // Accounts
        .route("/auth/register", post(api::auth::register))
        .route("/auth/login", post(api::auth::login))
        .route("/auth/verify", post(api::auth::verify_email))
        .route("/auth/change-password", post(api::auth::change_password))
        .route("/auth/profile", get(api::auth::get_profile))
        .route("/auth/profile", put(api::auth::update_profile))
        // Books (catalog browsing is public, everything else authenticated)
        .route("/books", get(api::books::list_books))
        .route("/books", post(api::books::add_book))
        .route("/books/filter", get(api::books::filter_books))
        .route("/books/search", get(api::books::search_books))
        .route("/books/borrowed", get(api::books::borrowed_books))
        .route("/books/reserve", post(api::books::reserve_book))
        .route("/books/return", post(api::books::return_book))
        .route("/books/:index", put(api::books::update_book))
        .route("/books/:index", delete(api::books::remove_book))
        .route("/books/:index/status", put(api::books::change_book_status))
        // Topics
        .route("/topics", get(api::topics::list_topics))
        .route("/topics/:id", get(api::topics::get_topic))
        // Geography
        .route("/geo/continents", get(api::geo::list_continents))
        .route(
            "/geo/continents/:continent/countries",
            get(api::geo::list_countries),
        )
        .route(
            "/geo/continents/:continent/countries/:country/provinces",
            get(api::geo::list_provinces),
        )
        .route(
            "/geo/continents/:continent/countries/:country/provinces/:province/cities",
            get(api::geo::list_cities),
        )
        .with_state(state.clone());

    // OpenAPI documentation
    let openapi = api::openapi::create_openapi_router();

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
