//! Application state shared across handlers

use std::sync::Arc;

use anyhow::Result;
use auth::{IdentityProvider, JwtService, SessionManager, UserStore};
use media::{ImageAssetManager, ImageStore};
use sqlx::PgPool;

use crate::{
    config::AppConfig,
    importer::PlaylistImporter,
    notes::NotesService,
    rate_limiter::RateLimits,
    repositories::{NoteStore, PlaylistStore},
    youtube::VideoCatalog,
};

/// Storage and external service adapters the application runs on
pub struct Backends {
    /// Pool reported by the health route; absent when running on other stores
    pub db_pool: Option<PgPool>,
    pub users: Arc<dyn UserStore>,
    pub identity_provider: Arc<dyn IdentityProvider>,
    pub playlists: Arc<dyn PlaylistStore>,
    pub notes: Arc<dyn NoteStore>,
    pub catalog: Arc<dyn VideoCatalog>,
    pub image_store: Arc<dyn ImageStore>,
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db_pool: Option<PgPool>,
    pub users: Arc<dyn UserStore>,
    pub playlists: Arc<dyn PlaylistStore>,
    pub sessions: SessionManager,
    pub importer: PlaylistImporter,
    pub notes: NotesService,
    pub images: ImageAssetManager,
    pub rate_limits: RateLimits,
}

impl AppState {
    /// Wire the services on top of their backends
    pub fn new(config: AppConfig, backends: Backends) -> Result<Self> {
        let jwt_service = JwtService::new(config.jwt.clone())?;
        let sessions = SessionManager::new(
            backends.users.clone(),
            backends.identity_provider,
            jwt_service,
        );
        let importer = PlaylistImporter::new(
            backends.catalog,
            backends.playlists.clone(),
            config.youtube.max_entries,
        );
        let images = ImageAssetManager::new(backends.image_store, &config.storage.public_base_url);
        let rate_limits = RateLimits::new(&config.rate_limit);

        Ok(Self {
            db_pool: backends.db_pool,
            users: backends.users,
            playlists: backends.playlists,
            sessions,
            importer,
            notes: NotesService::new(backends.notes),
            images,
            rate_limits,
            config: Arc::new(config),
        })
    }
}
