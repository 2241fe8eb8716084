//! classreg server entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use classreg_api::{endpoints, middleware::AppState};
use classreg_common::{Config, RedisRoleStore, RoleCache};
use classreg_core::{NotificationService, UserService};
use classreg_db::repositories::{LinkRepository, NotificationRepository, UserRepository};
use fred::interfaces::ClientLike;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
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
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "classreg=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting classreg server...");

    let config = Config::load().context("Failed to load configuration")?;

    let db = classreg_db::init(&config)
        .await
        .context("Failed to connect to database")?;
    info!("Connected to database");

    info!("Running database migrations...");
    classreg_db::migrate(&db)
        .await
        .context("Failed to run migrations")?;
    info!("Migrations completed");

    info!("Connecting to Redis...");
    let redis_config = fred::types::config::Config::from_url(&config.redis.url)
        .context("Failed to parse Redis URL")?;
    let redis_client = fred::clients::Client::new(redis_config, None, None, None);
    redis_client.connect();
    redis_client
        .wait_for_connect()
        .await
        .context("Failed to connect to Redis")?;
    let redis_client = Arc::new(redis_client);
    info!("Connected to Redis");

    // Repositories
    let db = Arc::new(db);
    let user_repo = UserRepository::new(Arc::clone(&db));
    let link_repo = LinkRepository::new(Arc::clone(&db));
    let notification_repo = NotificationRepository::new(Arc::clone(&db));

    // Services
    let role_cache: RoleCache = Arc::new(RedisRoleStore::new(redis_client));
    let user_service =
        UserService::with_cache(user_repo.clone(), link_repo.clone(), role_cache.clone());
    let notification_service = NotificationService::new(user_repo, link_repo, notification_repo);

    let state = AppState {
        user_service,
        notification_service,
        role_cache,
    };

    let app = endpoints::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}
