//! Fabula server entry point.

use std::sync::Arc;
use std::time::Duration;

use axum::{Router, middleware};
use fabula_api::{middleware::AppState, router as api_router};
use fabula_common::Config;
use fabula_core::{
    AnalyticsService, BookmarkService, CacheService, CategoryService, ExpiryService,
    MemberService, PublishingService, RatingService, ReadingProgressService, SettingsService,
    StoryService, TagService,
};
use fabula_db::repositories::{
    BookmarkRepository, CategoryRepository, MemberRepository, PublishingHistoryRepository,
    RatingRepository, ReadingProgressRepository, StoryRepository, TagRepository,
};
use fred::interfaces::ClientLike;
use tokio::signal;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Maximum accepted request body size in bytes.
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fabula=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting fabula server...");

    // Load configuration
    let config = Config::load()?;

    // Connect to database
    let db = Arc::new(fabula_db::init(&config).await?);
    info!("Connected to database");

    // Run migrations
    info!("Running database migrations...");
    fabula_db::migrate(&db).await?;
    info!("Migrations completed");

    // Connect to Redis for the view cache
    info!("Connecting to Redis...");
    let redis_config = fred::types::config::Config::from_url(&config.redis.url)?;
    let redis = fred::clients::Client::new(redis_config, None, None, None);
    redis.connect();
    redis.wait_for_connect().await?;
    info!("Connected to Redis");

    let cache_service = CacheService::new(
        Arc::new(redis),
        config.redis.prefix.clone(),
        config.publishing.invalidation_policy,
    );

    // Initialize repositories
    let member_repo = MemberRepository::new(Arc::clone(&db));
    let story_repo = StoryRepository::new(Arc::clone(&db));
    let category_repo = CategoryRepository::new(Arc::clone(&db));
    let rating_repo = RatingRepository::new(Arc::clone(&db));
    let bookmark_repo = BookmarkRepository::new(Arc::clone(&db));
    let progress_repo = ReadingProgressRepository::new(Arc::clone(&db));
    let tag_repo = TagRepository::new(Arc::clone(&db));
    let history_repo = PublishingHistoryRepository::new(Arc::clone(&db));

    // Initialize services
    let settings_service = SettingsService::new(Arc::clone(&db), &config.publishing);

    let member_service = MemberService::new(member_repo.clone(), settings_service.clone());
    let story_service = StoryService::new(
        story_repo.clone(),
        category_repo.clone(),
        rating_repo.clone(),
        settings_service.clone(),
        cache_service.clone(),
    );
    let publishing_service = PublishingService::new(
        Arc::clone(&db),
        story_repo.clone(),
        history_repo,
        settings_service.clone(),
        cache_service.clone(),
    );
    let rating_service = RatingService::new(
        Arc::clone(&db),
        rating_repo.clone(),
        story_repo.clone(),
        settings_service.clone(),
        cache_service.clone(),
    );
    let bookmark_service = BookmarkService::new(
        bookmark_repo,
        story_repo.clone(),
        settings_service.clone(),
    );
    let progress_service = ReadingProgressService::new(progress_repo, story_repo.clone());
    let category_service = CategoryService::new(category_repo.clone(), story_repo.clone());
    let tag_service = TagService::new(tag_repo, story_repo.clone());
    let expiry_service = ExpiryService::new(
        story_repo.clone(),
        category_repo,
        rating_repo.clone(),
        settings_service.clone(),
    );
    let analytics_service = AnalyticsService::new(
        story_repo,
        member_repo,
        rating_repo,
        settings_service.clone(),
        cache_service,
    );

    // Create app state
    let state = AppState {
        member_service,
        story_service,
        publishing_service,
        rating_service,
        bookmark_service,
        progress_service,
        category_service,
        tag_service,
        settings_service,
        expiry_service,
        analytics_service,
    };

    // Build router
    let app = Router::new()
        .nest("/api", api_router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            fabula_api::middleware::auth_middleware,
        ))
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    // Start server with graceful shutdown
    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
