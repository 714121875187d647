//! Note repository for database operations

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use sqlx::{PgPool, Row, postgres::PgRow, types::Json};
use uuid::Uuid;

use crate::models::notes::Note;

/// Note persistence contract
#[async_trait]
pub trait NoteStore: Send + Sync {
    /// The note a user keeps for a video, oldest first if several exist
    async fn find(&self, user_id: Uuid, video_id: &str) -> Result<Option<Note>>;

    async fn create(
        &self,
        user_id: Uuid,
        video_id: &str,
        playlist_id: Uuid,
        content: &Value,
    ) -> Result<Note>;

    /// Replace the document of an existing note
    async fn update_content(&self, id: Uuid, content: &Value) -> Result<Note>;
}

/// Postgres-backed note repository
#[derive(Clone)]
pub struct NoteRepository {
    pool: PgPool,
}

impl NoteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn map_row(row: &PgRow) -> Result<Note> {
        let content: Json<Value> = row.try_get("content")?;
        Ok(Note {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            video_id: row.try_get("video_id")?,
            playlist_id: row.try_get("playlist_id")?,
            content: content.0,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[async_trait]
impl NoteStore for NoteRepository {
    async fn find(&self, user_id: Uuid, video_id: &str) -> Result<Option<Note>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, video_id, playlist_id, content, created_at, updated_at
            FROM video_notes
            WHERE user_id = $1 AND video_id = $2
            ORDER BY created_at ASC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .bind(video_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::map_row).transpose()
    }

    async fn create(
        &self,
        user_id: Uuid,
        video_id: &str,
        playlist_id: Uuid,
        content: &Value,
    ) -> Result<Note> {
        let now = Utc::now();
        let row = sqlx::query(
            r#"
            INSERT INTO video_notes (id, user_id, video_id, playlist_id, content, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            RETURNING id, user_id, video_id, playlist_id, content, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(video_id)
        .bind(playlist_id)
        .bind(Json(content))
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Self::map_row(&row)
    }

    async fn update_content(&self, id: Uuid, content: &Value) -> Result<Note> {
        let row = sqlx::query(
            r#"
            UPDATE video_notes
            SET content = $1, updated_at = $2
            WHERE id = $3
            RETURNING id, user_id, video_id, playlist_id, content, created_at, updated_at
            "#,
        )
        .bind(Json(content))
        .bind(Utc::now())
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Self::map_row(&row)
    }
}
