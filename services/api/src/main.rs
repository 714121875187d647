use std::{net::SocketAddr, sync::Arc};

use anyhow::Result;
use api::{
    AppConfig, AppState, Backends, create_router,
    repositories::{NoteRepository, PlaylistRepository},
    youtube::YoutubeClient,
};
use auth::{GoogleIdentityProvider, UserRepository};
use common::database::{health_check, init_pool, run_migrations};
use media::S3ImageStore;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting API service");

    let config = AppConfig::load()?;

    // Initialize database connection pool
    let pool = init_pool(&config.database).await?;
    if health_check(&pool).await {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }
    run_migrations(&pool).await?;

    let backends = Backends {
        db_pool: Some(pool.clone()),
        users: Arc::new(UserRepository::new(pool.clone())),
        identity_provider: Arc::new(GoogleIdentityProvider::new(&config.oauth)?),
        playlists: Arc::new(PlaylistRepository::new(pool.clone())),
        notes: Arc::new(NoteRepository::new(pool)),
        catalog: Arc::new(YoutubeClient::new(config.youtube.clone())),
        image_store: Arc::new(S3ImageStore::from_config(&config.storage).await),
    };

    let bind_address = config.server.bind_address.clone();
    let app_state = AppState::new(config, backends)?;

    // Start the web server
    let app = create_router(app_state);

    let listener = TcpListener::bind(&bind_address).await?;
    info!("API service listening on {}", bind_address);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("API service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutdown signal received");
}
