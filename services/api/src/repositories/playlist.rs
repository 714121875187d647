//! Playlist repository for database operations

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Row, postgres::PgRow, types::Json};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::models::playlist::{NewPlaylist, Playlist, VideoEntry};

/// Why a playlist could not be inserted
#[derive(Error, Debug)]
pub enum CreatePlaylistError {
    #[error("playlist already imported by this user")]
    AlreadyExists,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Playlist persistence contract
///
/// Every lookup is scoped to the owning user.
#[async_trait]
pub trait PlaylistStore: Send + Sync {
    /// Whether the user already imported this YouTube playlist
    async fn exists(&self, user_id: Uuid, external_id: &str) -> Result<bool>;

    /// Insert a new playlist with no completed entries
    async fn create(&self, new_playlist: NewPlaylist) -> Result<Playlist, CreatePlaylistError>;

    /// All playlists of a user, oldest first
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Playlist>>;

    async fn find_for_user(&self, id: Uuid, user_id: Uuid) -> Result<Option<Playlist>>;

    /// Delete a playlist, returning whether one was removed
    async fn delete_for_user(&self, id: Uuid, user_id: Uuid) -> Result<bool>;

    /// Persist the entries and completed count of a playlist in one write
    async fn update_completion(&self, playlist: &Playlist) -> Result<()>;
}

/// Postgres-backed playlist repository
#[derive(Clone)]
pub struct PlaylistRepository {
    pool: PgPool,
}

const PLAYLIST_COLUMNS: &str =
    "id, user_id, external_id, title, image_url, content, completed_count, created_at, updated_at";

impl PlaylistRepository {
    /// Create a new playlist repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn map_row(row: &PgRow) -> Result<Playlist> {
        let content: Json<Vec<VideoEntry>> = row.try_get("content")?;
        Ok(Playlist {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            external_id: row.try_get("external_id")?,
            title: row.try_get("title")?,
            image_url: row.try_get("image_url")?,
            content: content.0,
            completed_count: row.try_get("completed_count")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[async_trait]
impl PlaylistStore for PlaylistRepository {
    async fn exists(&self, user_id: Uuid, external_id: &str) -> Result<bool> {
        let row = sqlx::query(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM playlists WHERE user_id = $1 AND external_id = $2
            ) AS present
            "#,
        )
        .bind(user_id)
        .bind(external_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.try_get("present")?)
    }

    async fn create(&self, new_playlist: NewPlaylist) -> Result<Playlist, CreatePlaylistError> {
        info!(
            "Storing playlist {} with {} entries for user {}",
            new_playlist.external_id,
            new_playlist.content.len(),
            new_playlist.user_id
        );

        let now = Utc::now();
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO playlists
                (id, user_id, external_id, title, image_url, content, completed_count, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
            RETURNING {}
            "#,
            PLAYLIST_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(new_playlist.user_id)
        .bind(&new_playlist.external_id)
        .bind(&new_playlist.title)
        .bind(&new_playlist.image_url)
        .bind(Json(&new_playlist.content))
        .bind(Playlist::count_completed(&new_playlist.content))
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if common::error::is_unique_violation(&e) {
                CreatePlaylistError::AlreadyExists
            } else {
                CreatePlaylistError::Other(e.into())
            }
        })?;

        Ok(Self::map_row(&row)?)
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Playlist>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM playlists WHERE user_id = $1 ORDER BY created_at ASC",
            PLAYLIST_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::map_row).collect()
    }

    async fn find_for_user(&self, id: Uuid, user_id: Uuid) -> Result<Option<Playlist>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM playlists WHERE id = $1 AND user_id = $2",
            PLAYLIST_COLUMNS
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::map_row).transpose()
    }

    async fn delete_for_user(&self, id: Uuid, user_id: Uuid) -> Result<bool> {
        info!("Deleting playlist {} of user {}", id, user_id);

        let result = sqlx::query("DELETE FROM playlists WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_completion(&self, playlist: &Playlist) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE playlists
            SET content = $1, completed_count = $2, updated_at = $3
            WHERE id = $4 AND user_id = $5
            "#,
        )
        .bind(Json(&playlist.content))
        .bind(playlist.completed_count)
        .bind(Utc::now())
        .bind(playlist.id)
        .bind(playlist.user_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
