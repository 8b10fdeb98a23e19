//! Database repository for users.
//!
//! Users have no CRUD API surface, only the authentication flow, so this
//! repository exposes bespoke methods instead of the full [`Repository`]
//! trait.
//!
//! [`Repository`]: crate::db::handlers::Repository

use crate::db::{
    errors::{DbError, Result},
    models::users::{UserCreateDBRequest, UserDBResponse},
};
use crate::types::UserId;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection};
use tracing::instrument;

// Database entity model
#[derive(Debug, Clone, FromRow)]
struct User {
    pub id: UserId,
    pub username: String,
    pub password_hash: String,
    pub refresh_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserDBResponse {
    fn from(src: User) -> Self {
        Self {
            id: src.id,
            username: src.username,
            password_hash: src.password_hash,
            refresh_token: src.refresh_token,
            created_at: src.created_at,
            updated_at: src.updated_at,
        }
    }
}

pub struct Users<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Users<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(username = %request.username), err)]
    pub async fn create(&mut self, request: &UserCreateDBRequest) -> Result<UserDBResponse> {
        let user = sqlx::query_as!(
            User,
            r#"
            INSERT INTO users (username, password_hash)
            VALUES ($1, $2)
            RETURNING *
            "#,
            request.username,
            request.password_hash
        )
        .fetch_one(&mut *self.db)
        .await?;

        Ok(user.into())
    }

    #[instrument(skip(self), fields(user_id = id), err)]
    pub async fn get_by_id(&mut self, id: UserId) -> Result<Option<UserDBResponse>> {
        let user = sqlx::query_as!(User, "SELECT * FROM users WHERE id = $1", id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(user.map(Into::into))
    }

    #[instrument(skip(self, username), err)]
    pub async fn get_by_username(&mut self, username: &str) -> Result<Option<UserDBResponse>> {
        let user = sqlx::query_as!(User, "SELECT * FROM users WHERE username = $1", username)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(user.map(Into::into))
    }

    /// Store the user's sole valid refresh token. Whatever was stored before
    /// is gone, so a previously issued refresh token can never be used again.
    #[instrument(skip(self, refresh_token), fields(user_id = id), err)]
    pub async fn set_refresh_token(&mut self, id: UserId, refresh_token: &str) -> Result<()> {
        let result = sqlx::query!(
            "UPDATE users SET refresh_token = $2, updated_at = NOW() WHERE id = $1",
            id,
            refresh_token
        )
        .execute(&mut *self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }

        Ok(())
    }
}
