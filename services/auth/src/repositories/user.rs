//! User repository for database operations

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Row, postgres::PgRow};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::models::{AccountType, NewUser, User};

/// Why a user could not be created
#[derive(Error, Debug)]
pub enum CreateUserError {
    #[error("an account with this email already exists")]
    DuplicateEmail,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Credential store contract
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Create a new user
    async fn create(&self, new_user: &NewUser) -> Result<User, CreateUserError>;

    /// Find a user by email
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Find a user by ID
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;
}

/// Postgres-backed user repository
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn map_row(row: &PgRow) -> Result<User> {
        let account_type: String = row.try_get("account_type")?;
        Ok(User {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            password_hash: row.try_get("password_hash")?,
            account_type: account_type
                .parse::<AccountType>()
                .map_err(|e| anyhow::anyhow!(e))?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[async_trait]
impl UserStore for UserRepository {
    async fn create(&self, new_user: &NewUser) -> Result<User, CreateUserError> {
        info!("Creating new {} user: {}", new_user.account_type, new_user.email);

        let now = Utc::now();
        let row = sqlx::query(
            r#"
            INSERT INTO users (id, name, email, password_hash, account_type, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            RETURNING id, name, email, password_hash, account_type, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new_user.name)
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .bind(new_user.account_type.as_str())
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if common::error::is_unique_violation(&e) {
                CreateUserError::DuplicateEmail
            } else {
                CreateUserError::Other(e.into())
            }
        })?;

        Ok(Self::map_row(&row)?)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        info!("Finding user by email: {}", email);

        let row = sqlx::query(
            r#"
            SELECT id, name, email, password_hash, account_type, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::map_row).transpose()
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        info!("Finding user by ID: {}", id);

        let row = sqlx::query(
            r#"
            SELECT id, name, email, password_hash, account_type, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::map_row).transpose()
    }
}
