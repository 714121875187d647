//! Custom error types for the API service

use auth::AuthError;
use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    extract::multipart::MultipartRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use media::MediaError;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use crate::{importer::ImportError, models::playlist::CompletionError};

/// Custom error type for the API service
#[derive(Error, Debug)]
pub enum ApiError {
    /// Missing or invalid session
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Bad request with message
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    /// Duplicate resource; reported as 404 like the other lookup failures
    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unprocessable(String),

    #[error("{0}")]
    TooManyRequests(String),

    /// Editor image upload failure
    #[error("{0}")]
    Upload(String),

    /// Internal server error
    #[error("Internal Server error")]
    InternalServerError,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Unauthorized | ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) | ApiError::Upload(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) | ApiError::Conflict(_) => StatusCode::NOT_FOUND,
            ApiError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::TooManyRequests(_) => StatusCode::TOO_MANY_REQUESTS,
            ApiError::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = match &self {
            ApiError::Upload(message) => json!({ "success": 0, "message": message }),
            other => json!({ "message": other.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::Validation(message) => ApiError::BadRequest(message),
            AuthError::MissingIdToken => ApiError::BadRequest(e.to_string()),
            AuthError::Unauthorized => ApiError::Unauthorized,
            AuthError::InvalidCredentials => ApiError::InvalidCredentials,
            AuthError::NotFound(message) => ApiError::NotFound(message),
            AuthError::Conflict(message) => ApiError::Conflict(message),
            AuthError::AccountCreation => ApiError::Unprocessable(e.to_string()),
            AuthError::ExternalService(message) => {
                error!("Identity provider failure: {}", message);
                ApiError::InternalServerError
            }
            AuthError::Internal(message) => {
                error!("Authentication failure: {}", message);
                ApiError::InternalServerError
            }
        }
    }
}

impl From<ImportError> for ApiError {
    fn from(e: ImportError) -> Self {
        match e {
            ImportError::InvalidId => ApiError::BadRequest(e.to_string()),
            ImportError::AlreadyImported => ApiError::Conflict(e.to_string()),
            ImportError::NotFound(message) => ApiError::NotFound(message),
            ImportError::Upstream(e) => {
                error!("Playlist import failed upstream: {}", e);
                ApiError::InternalServerError
            }
            ImportError::Store(e) => {
                error!("Playlist import failed: {}", e);
                ApiError::InternalServerError
            }
        }
    }
}

impl From<CompletionError> for ApiError {
    fn from(e: CompletionError) -> Self {
        match e {
            CompletionError::NotFound => ApiError::NotFound(e.to_string()),
            CompletionError::IndexOutOfRange { .. } => ApiError::BadRequest(e.to_string()),
            CompletionError::Store(e) => {
                error!("Failed to update completion: {}", e);
                ApiError::InternalServerError
            }
        }
    }
}

impl From<MediaError> for ApiError {
    fn from(e: MediaError) -> Self {
        ApiError::Upload(e.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(e: JsonRejection) -> Self {
        warn!("Rejected request body: {}", e.body_text());
        ApiError::BadRequest(e.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(e: PathRejection) -> Self {
        warn!("Rejected path parameters: {}", e.body_text());
        ApiError::BadRequest(e.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(e: QueryRejection) -> Self {
        ApiError::BadRequest(e.body_text())
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(e: MultipartRejection) -> Self {
        ApiError::Upload(e.body_text())
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;
