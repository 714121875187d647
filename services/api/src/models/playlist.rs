//! Playlist models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

const EMBED_URL_PREFIX: &str = "https://www.youtube.com/embed/";

/// Preview image of a video
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thumbnail {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

/// One video of an imported playlist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoEntry {
    pub title: String,
    pub video_id: String,
    pub video_url: String,
    #[serde(default)]
    pub thumbnail: Option<Thumbnail>,
    #[serde(default)]
    pub completed: bool,
}

impl VideoEntry {
    /// A not-yet-watched entry with its embeddable URL
    pub fn new(title: String, video_id: String, thumbnail: Option<Thumbnail>) -> Self {
        Self {
            video_url: format!("{}{}", EMBED_URL_PREFIX, video_id),
            title,
            video_id,
            thumbnail,
            completed: false,
        }
    }
}

/// A playlist imported by a user
#[derive(Debug, Clone, Serialize)]
pub struct Playlist {
    pub id: Uuid,
    #[serde(rename = "userId")]
    pub user_id: Uuid,
    /// Identifier of the playlist on YouTube
    #[serde(rename = "playListId")]
    pub external_id: String,
    #[serde(rename = "playListTitle")]
    pub title: String,
    #[serde(rename = "playListImage")]
    pub image_url: String,
    #[serde(rename = "playListContent")]
    pub content: Vec<VideoEntry>,
    /// Always equal to the number of completed entries in `content`
    #[serde(rename = "completedCount")]
    pub completed_count: i32,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

/// Why a completion toggle was refused
#[derive(Error, Debug)]
pub enum CompletionError {
    #[error("PlayList not found")]
    NotFound,

    #[error("Video index out of range")]
    IndexOutOfRange { index: usize, len: usize },

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl Playlist {
    /// Flip the completion flag of the entry at `index`, returning its new state
    ///
    /// The count is adjusted incrementally rather than recomputed.
    pub fn toggle_completion(&mut self, index: usize) -> Result<bool, CompletionError> {
        let len = self.content.len();
        let entry = self
            .content
            .get_mut(index)
            .ok_or(CompletionError::IndexOutOfRange { index, len })?;
        entry.completed = !entry.completed;
        let completed = entry.completed;
        self.completed_count += if completed { 1 } else { -1 };
        debug_assert_eq!(self.completed_count, Self::count_completed(&self.content));
        Ok(completed)
    }

    pub fn count_completed(entries: &[VideoEntry]) -> i32 {
        entries.iter().filter(|entry| entry.completed).count() as i32
    }
}

/// Data needed to persist a freshly imported playlist
#[derive(Debug, Clone)]
pub struct NewPlaylist {
    pub user_id: Uuid,
    pub external_id: String,
    pub title: String,
    pub image_url: String,
    pub content: Vec<VideoEntry>,
}
