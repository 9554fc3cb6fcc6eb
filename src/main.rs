//! following-service - Follow-Graph Backend API
//!
//! Backend service maintaining follow relationships between users and
//! communities. Relationship changes are persisted to Postgres and then
//! announced on the message broker; created-entity topics are consumed to
//! mirror users and communities written by other services.

use std::net::SocketAddr;
use std::sync::Arc;

use redis::aio::ConnectionManager;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use following_service::api::{create_router, AppState};
use following_service::events::handlers::{CommunityCreatedHandler, UserCreatedHandler};
use following_service::events::messages::{
    COMMUNITY_CREATED_TOPIC, COMMUNITY_FOLLOWED_TOPIC, COMMUNITY_UNFOLLOWED_TOPIC,
    USER_CREATED_TOPIC, USER_FOLLOWED_TOPIC, USER_UNFOLLOWED_TOPIC,
};
use following_service::events::{Consumer, Producer, RedisProducer, RedisReader};
use following_service::service::{CommunityService, UserService};
use following_service::{db, Config, Store};

/// Initialize tracing/logging
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "following_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    init_tracing();

    // Load configuration
    let config = Config::from_env()?;
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    tracing::info!("Starting following-service");
    tracing::info!("Connecting to database...");

    // Create database pool
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await?;

    // Verify database schema
    if !db::check_schema(&pool).await? {
        tracing::error!("Database schema is not complete. Please run migrations.");
        return Err(anyhow::anyhow!("Database schema incomplete"));
    }

    tracing::info!("Database connected successfully");
    tracing::info!("Connecting to message broker...");

    let broker = redis::Client::open(config.broker_url.as_str())?;
    let conn = ConnectionManager::new(broker.clone()).await?;

    let user_followed = Arc::new(RedisProducer::new(conn.clone(), USER_FOLLOWED_TOPIC));
    let user_unfollowed = Arc::new(RedisProducer::new(conn.clone(), USER_UNFOLLOWED_TOPIC));
    let community_followed = Arc::new(RedisProducer::new(conn.clone(), COMMUNITY_FOLLOWED_TOPIC));
    let community_unfollowed = Arc::new(RedisProducer::new(conn, COMMUNITY_UNFOLLOWED_TOPIC));

    let producers: Vec<Arc<dyn Producer>> = vec![
        user_followed.clone(),
        user_unfollowed.clone(),
        community_followed.clone(),
        community_unfollowed.clone(),
    ];

    let store = Store::postgres(pool.clone());
    let users = Arc::new(UserService::new(
        store.users.clone(),
        user_followed,
        user_unfollowed,
    ));
    let communities = Arc::new(CommunityService::new(
        store.communities.clone(),
        community_followed,
        community_unfollowed,
    ));

    // Mirror entities created by other services
    let user_reader = RedisReader::subscribe(&broker, USER_CREATED_TOPIC).await?;
    let mut user_consumer = Consumer::new(
        USER_CREATED_TOPIC,
        user_reader,
        Arc::new(UserCreatedHandler::new(users.clone())),
    );
    user_consumer.start();

    let community_reader = RedisReader::subscribe(&broker, COMMUNITY_CREATED_TOPIC).await?;
    let mut community_consumer = Consumer::new(
        COMMUNITY_CREATED_TOPIC,
        community_reader,
        Arc::new(CommunityCreatedHandler::new(communities.clone())),
    );
    community_consumer.start();

    tracing::info!("Listening on http://{}", addr);

    let app = create_router(AppState { users, communities });

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Cleanup
    tracing::info!("Server shutting down...");
    user_consumer.stop().await;
    community_consumer.stop().await;
    for producer in producers {
        if let Err(err) = producer.stop().await {
            tracing::error!(error = %err, "producer stop failed");
        }
    }
    pool.close().await;
    tracing::info!("Database connections closed. Goodbye!");

    Ok(())
}

/// Shutdown signal handler for graceful shutdown
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}
