//! API models for request and response payloads

use serde::Deserialize;

pub mod notes;
pub mod playlist;

/// Request for password signup
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Request for password login
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Query of the OAuth callback exchange
#[derive(Debug, Deserialize)]
pub struct OAuthTokenQuery {
    pub code: Option<String>,
    #[serde(rename = "type")]
    pub flow: Option<String>,
}

/// Body of a note save
#[derive(Debug, Deserialize)]
pub struct SetNoteRequest {
    #[serde(rename = "notesContent")]
    pub notes_content: Option<serde_json::Value>,
}

/// Body of an image cleanup request
#[derive(Debug, Default, Deserialize)]
pub struct DeleteFilesRequest {
    #[serde(default)]
    pub urls: Vec<String>,
}
