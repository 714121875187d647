//! API service routes

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, State},
    http::{HeaderValue, Method, header},
    middleware,
    response::IntoResponse,
    routing::{delete, get, post},
};
use serde_json::json;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::error;

use crate::{
    config::ServerConfig,
    middleware::{rate_limit, require_session},
    state::AppState,
};

pub mod auth;
pub mod notes;
pub mod playlist;

/// Create the router for the API service
pub fn create_router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/url/:type", get(auth::oauth_url))
        .route("/token", get(auth::oauth_token))
        .route("/refresh", get(auth::refresh))
        .route("/logout", post(auth::logout))
        .merge(
            Router::new()
                .route("/signup", post(auth::signup))
                .route("/login", post(auth::login))
                .route_layer(middleware::from_fn_with_state(
                    state.rate_limits.auth.clone(),
                    rate_limit,
                )),
        );

    let playlist_routes = Router::new()
        .route("/addPlaylist/:playListId", get(playlist::add_playlist))
        .route("/getPlaylists", get(playlist::get_playlists))
        .route(
            "/getPlaylistVideos/:documentId",
            get(playlist::get_playlist_videos),
        )
        .route(
            "/deletePlaylist/:playlistDocumentId",
            delete(playlist::delete_playlist),
        )
        .route(
            "/markAsCompleted/:playListDocumentId/:videoIndex",
            get(playlist::mark_as_completed),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_session,
        ))
        .route_layer(middleware::from_fn_with_state(
            state.rate_limits.playlist.clone(),
            rate_limit,
        ));

    let notes_routes = Router::new()
        .route("/uploadFile", post(notes::upload_file))
        .route("/deleteFiles", post(notes::delete_files))
        .route("/getNote/:videoId", get(notes::get_note))
        .route("/setNote/:videoId/:playListId", post(notes::set_note))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_session,
        ))
        .route_layer(middleware::from_fn_with_state(
            state.rate_limits.notes.clone(),
            rate_limit,
        ))
        .layer(DefaultBodyLimit::max(state.config.server.max_upload_bytes));

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .nest("/auth", auth_routes)
        .nest("/playList", playlist_routes)
        .nest("/notes", notes_routes)
        .layer(middleware::from_fn_with_state(
            state.rate_limits.general.clone(),
            rate_limit,
        ))
        .layer(cors_layer(&state.config.server))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Only the configured client origin may call the API, with credentials
fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
        .allow_credentials(true);

    match HeaderValue::from_str(&config.client_origin) {
        Ok(origin) => cors.allow_origin(origin),
        Err(e) => {
            error!("Invalid client origin {:?}: {}", config.client_origin, e);
            cors
        }
    }
}

pub async fn root() -> impl IntoResponse {
    Json(json!({ "message": "hello" }))
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let database = match &state.db_pool {
        Some(pool) => common::health_check(pool).await,
        None => false,
    };

    Json(json!({
        "status": "ok",
        "service": "ytnotes-api",
        "database": database,
    }))
}
