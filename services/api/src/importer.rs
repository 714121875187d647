//! Playlist import from YouTube

use std::sync::Arc;

use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    models::playlist::{NewPlaylist, Playlist},
    repositories::{CreatePlaylistError, PlaylistStore},
    youtube::{CatalogError, VideoCatalog},
};

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Invalid playlist id")]
    InvalidId,

    #[error("Playlist already exists")]
    AlreadyImported,

    #[error("{0}")]
    NotFound(String),

    #[error("YouTube request failed: {0}")]
    Upstream(#[from] CatalogError),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

/// Imports YouTube playlists into a user's library
#[derive(Clone)]
pub struct PlaylistImporter {
    catalog: Arc<dyn VideoCatalog>,
    playlists: Arc<dyn PlaylistStore>,
    max_entries: usize,
}

impl PlaylistImporter {
    pub fn new(
        catalog: Arc<dyn VideoCatalog>,
        playlists: Arc<dyn PlaylistStore>,
        max_entries: usize,
    ) -> Self {
        Self {
            catalog,
            playlists,
            max_entries,
        }
    }

    /// Import a playlist for a user
    ///
    /// Pages are fetched while the upstream reports a next page and fewer than
    /// `max_entries` entries were collected. The last page is kept whole, so
    /// the stored count can exceed `max_entries` by less than one page.
    pub async fn import_playlist(
        &self,
        external_id: &str,
        user_id: Uuid,
    ) -> Result<Playlist, ImportError> {
        if !is_valid_playlist_id(external_id) {
            return Err(ImportError::InvalidId);
        }

        if self.playlists.exists(user_id, external_id).await? {
            warn!("User {} already imported playlist {}", user_id, external_id);
            return Err(ImportError::AlreadyImported);
        }

        let metadata = self
            .catalog
            .playlist_metadata(external_id)
            .await
            .map_err(not_found_upstream)?
            .ok_or_else(|| ImportError::NotFound("PlayList not found".to_string()))?;

        let mut page = self
            .catalog
            .playlist_page(external_id, None)
            .await
            .map_err(not_found_upstream)?;
        let mut entries = std::mem::take(&mut page.entries);
        let mut next_page_token = page.next_page_token;

        while let Some(token) = next_page_token.take() {
            if entries.len() >= self.max_entries {
                info!(
                    "Stopping import of {} at {} entries",
                    external_id,
                    entries.len()
                );
                break;
            }

            let page = self
                .catalog
                .playlist_page(external_id, Some(&token))
                .await
                .map_err(not_found_upstream)?;
            entries.extend(page.entries);
            next_page_token = page.next_page_token;
        }

        if entries.is_empty() {
            return Err(ImportError::NotFound("PlayList has no videos".to_string()));
        }

        info!(
            "Importing playlist {} ({} entries) for user {}",
            external_id,
            entries.len(),
            user_id
        );

        self.playlists
            .create(NewPlaylist {
                user_id,
                external_id: external_id.to_string(),
                title: metadata.title,
                image_url: metadata.image_url,
                content: entries,
            })
            .await
            .map_err(|e| match e {
                CreatePlaylistError::AlreadyExists => ImportError::AlreadyImported,
                CreatePlaylistError::Other(e) => {
                    error!("Failed to store playlist {}: {}", external_id, e);
                    ImportError::Store(e)
                }
            })
    }
}

fn not_found_upstream(e: CatalogError) -> ImportError {
    match e {
        CatalogError::NotFound => ImportError::NotFound("PlayList not found".to_string()),
        other => ImportError::Upstream(other),
    }
}

/// YouTube playlist ids are URL-safe base64-like tokens
fn is_valid_playlist_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= 64
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
