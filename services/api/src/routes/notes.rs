//! Note and editor image routes

use axum::{
    Extension, Json,
    extract::{Multipart, Path, State},
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use serde_json::json;
use tracing::{error, warn};
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    middleware::AuthUser,
    models::{DeleteFilesRequest, SetNoteRequest},
    routes::playlist::current_account,
    state::AppState,
};

const UPLOAD_FIELD: &str = "file";

/// Store an image dropped into the editor
pub async fn upload_file(
    State(state): State<AppState>,
    WithRejection(mut multipart, _): WithRejection<Multipart, ApiError>,
) -> ApiResult<impl IntoResponse> {
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        warn!("Malformed multipart upload: {}", e);
        ApiError::Upload(e.body_text())
    })? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        if !content_type.starts_with("image/") {
            return Err(ApiError::Upload("Only images can be uploaded".to_string()));
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let body = field.bytes().await.map_err(|e| {
            warn!("Failed to read upload body: {}", e);
            ApiError::Upload(e.body_text())
        })?;

        let uploaded = state
            .images
            .upload_image(body, &content_type, &file_name)
            .await?;

        return Ok(Json(json!({
            "success": 1,
            "file": { "url": uploaded.url },
        })));
    }

    Err(ApiError::Upload("No file uploaded".to_string()))
}

/// Remove images the editor no longer references
pub async fn delete_files(
    State(state): State<AppState>,
    WithRejection(Json(payload), _): WithRejection<Json<DeleteFilesRequest>, ApiError>,
) -> ApiResult<impl IntoResponse> {
    state.images.delete_images(&payload.urls).await;

    Ok(Json(json!({ "message": "Images deleted successfully" })))
}

pub async fn get_note(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Path(video_id), _): WithRejection<Path<String>, ApiError>,
) -> ApiResult<impl IntoResponse> {
    let account = current_account(&state, &user).await?;
    let note = state
        .notes
        .get_note(account.id, &video_id)
        .await
        .map_err(|e| {
            error!("Failed to load note for video {}: {}", video_id, e);
            ApiError::InternalServerError
        })?;

    Ok(Json(match note {
        Some(note) => json!({ "success": 1, "notesDetails": note }),
        None => json!({ "success": 0, "message": "Failed to Load notes" }),
    }))
}

/// Create or replace the note of a video
pub async fn set_note(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Path((video_id, playlist_id)), _): WithRejection<
        Path<(String, Uuid)>,
        ApiError,
    >,
    WithRejection(Json(payload), _): WithRejection<Json<SetNoteRequest>, ApiError>,
) -> ApiResult<impl IntoResponse> {
    let content = payload
        .notes_content
        .ok_or_else(|| ApiError::BadRequest("notesContent is required".to_string()))?;
    let account = current_account(&state, &user).await?;

    state
        .notes
        .set_note(account.id, &video_id, playlist_id, content)
        .await
        .map_err(|e| {
            error!("Failed to save note for video {}: {}", video_id, e);
            ApiError::InternalServerError
        })?;

    Ok(Json(json!({
        "success": 1,
        "message": "notes created and updated",
    })))
}
