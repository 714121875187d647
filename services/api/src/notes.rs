//! Per-video notes

use std::sync::Arc;

use anyhow::Result;
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::{models::notes::Note, repositories::NoteStore};

/// Notes service
#[derive(Clone)]
pub struct NotesService {
    store: Arc<dyn NoteStore>,
}

impl NotesService {
    pub fn new(store: Arc<dyn NoteStore>) -> Self {
        Self { store }
    }

    pub async fn get_note(&self, user_id: Uuid, video_id: &str) -> Result<Option<Note>> {
        self.store.find(user_id, video_id).await
    }

    /// Save the note of a video, replacing the existing document if any
    ///
    /// Lookup then write, not atomic: two concurrent first saves can both
    /// insert.
    pub async fn set_note(
        &self,
        user_id: Uuid,
        video_id: &str,
        playlist_id: Uuid,
        content: Value,
    ) -> Result<Note> {
        match self.store.find(user_id, video_id).await? {
            Some(existing) => {
                info!("Updating note {} for video {}", existing.id, video_id);
                self.store.update_content(existing.id, &content).await
            }
            None => {
                info!("Creating note for video {} of user {}", video_id, user_id);
                self.store
                    .create(user_id, video_id, playlist_id, &content)
                    .await
            }
        }
    }
}
