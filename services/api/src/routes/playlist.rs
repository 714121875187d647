//! Playlist routes

use auth::User;
use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use serde_json::json;
use tracing::error;
use uuid::Uuid;

use crate::{
    completion,
    error::{ApiError, ApiResult},
    middleware::AuthUser,
    state::AppState,
};

/// The stored account behind a session
pub(crate) async fn current_account(state: &AppState, user: &AuthUser) -> ApiResult<User> {
    state
        .users
        .find_by_id(user.id)
        .await
        .map_err(|e| {
            error!("Failed to load account {}: {}", user.id, e);
            ApiError::InternalServerError
        })?
        .ok_or_else(|| ApiError::NotFound("Account not found".to_string()))
}

/// Import a YouTube playlist
pub async fn add_playlist(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Path(external_id), _): WithRejection<Path<String>, ApiError>,
) -> ApiResult<impl IntoResponse> {
    let account = current_account(&state, &user).await?;
    state
        .importer
        .import_playlist(&external_id, account.id)
        .await?;

    Ok(Json(json!({ "message": "Playlist Added" })))
}

/// List the caller's playlists
pub async fn get_playlists(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse> {
    let account = current_account(&state, &user).await?;
    let playlists = state
        .playlists
        .list_for_user(account.id)
        .await
        .map_err(|e| {
            error!("Failed to list playlists: {}", e);
            ApiError::InternalServerError
        })?;

    Ok(Json(json!({ "playLists": playlists })))
}

/// Get one playlist with its videos
pub async fn get_playlist_videos(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, ApiError>,
) -> ApiResult<impl IntoResponse> {
    let account = current_account(&state, &user).await?;
    let playlist = state
        .playlists
        .find_for_user(id, account.id)
        .await
        .map_err(|e| {
            error!("Failed to get playlist {}: {}", id, e);
            ApiError::InternalServerError
        })?
        .ok_or_else(|| ApiError::NotFound("PlayList not found".to_string()))?;

    Ok(Json(json!({ "playListDetails": playlist })))
}

/// Delete a playlist; notes taken on its videos are kept
pub async fn delete_playlist(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, ApiError>,
) -> ApiResult<impl IntoResponse> {
    let account = current_account(&state, &user).await?;
    let deleted = state
        .playlists
        .delete_for_user(id, account.id)
        .await
        .map_err(|e| {
            error!("Failed to delete playlist {}: {}", id, e);
            ApiError::InternalServerError
        })?;

    if !deleted {
        return Err(ApiError::NotFound("PlayList not found".to_string()));
    }

    Ok(Json(json!({ "message": "Playlist Deleted" })))
}

/// Toggle the completion flag of one video
pub async fn mark_as_completed(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Path((id, video_index)), _): WithRejection<Path<(Uuid, usize)>, ApiError>,
) -> ApiResult<impl IntoResponse> {
    let account = current_account(&state, &user).await?;
    completion::toggle_completion(state.playlists.as_ref(), id, video_index, account.id).await?;

    Ok(Json(json!({ "message": "List Updated" })))
}
