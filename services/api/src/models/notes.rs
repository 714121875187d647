use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Rich-text notes a user keeps for one video
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: Uuid,
    pub user_id: Uuid,
    pub video_id: String,
    /// Playlist the note was written from; not required to still exist
    #[serde(rename = "playListId")]
    pub playlist_id: Uuid,
    /// Opaque editor document
    #[serde(rename = "notesContent")]
    pub content: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
