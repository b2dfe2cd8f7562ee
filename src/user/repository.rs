//! Handle database requests.

use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::error::{Result, ServerError};
use crate::user::User;

const COLUMNS: &str = "id, name, email, phone_number, avatar, password, \
                       password_changed_at, reset_token, reset_expires, created_at";

#[derive(Clone)]
pub struct UserRepository {
    pool: Pool<Postgres>,
}

impl UserRepository {
    /// Create a new [`UserRepository`].
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Insert [`User`] into database.
    ///
    /// A duplicate email surfaces as the conflict error, not a bare SQL
    /// failure.
    pub async fn insert(&self, user: &User) -> Result<()> {
        sqlx::query(
            r#"INSERT INTO users (id, name, email, phone_number, avatar, password, created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7)"#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.phone_number)
        .bind(&user.avatar)
        .bind(&user.password)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|err| match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                ServerError::Conflict("An account with this email already exists.")
            },
            _ => err.into(),
        })?;

        Ok(())
    }

    /// Find current user using `id` field.
    pub async fn find_by_id(&self, user_id: Uuid) -> Result<User> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");

        sqlx::query_as::<_, User>(&query)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(ServerError::NotFound { entity: "user" })
    }

    /// Find current user using `email` field.
    pub async fn find_by_email(&self, email: &str) -> Result<User> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE email = $1");

        sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(ServerError::NotFound { entity: "user" })
    }

    /// Find the user holding a non-expired reset-token digest.
    pub async fn find_by_reset_token(
        &self,
        token_digest: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>> {
        let query = format!(
            "SELECT {COLUMNS} FROM users WHERE reset_token = $1 AND reset_expires > $2",
        );

        Ok(sqlx::query_as::<_, User>(&query)
            .bind(token_digest)
            .bind(now)
            .fetch_optional(&self.pool)
            .await?)
    }

    /// Update current user's profile fields.
    pub async fn update(&self, user: &User) -> Result<()> {
        sqlx::query(
            r#"UPDATE users
                SET name = $1, email = $2, phone_number = $3, avatar = $4
                WHERE id = $5"#,
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.phone_number)
        .bind(&user.avatar)
        .bind(user.id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Replace the password hash and stamp the change, so outstanding
    /// tokens stop being honored. Any pending reset token is consumed.
    pub async fn update_password(&self, user_id: Uuid, phc_hash: &str) -> Result<()> {
        sqlx::query(
            r#"UPDATE users
                SET password = $1, password_changed_at = $2,
                    reset_token = NULL, reset_expires = NULL
                WHERE id = $3"#,
        )
        .bind(phc_hash)
        .bind(Utc::now())
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Store a reset-token digest with its expiry.
    pub async fn set_reset_token(
        &self,
        user_id: Uuid,
        token_digest: &str,
        expires: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            r#"UPDATE users SET reset_token = $1, reset_expires = $2 WHERE id = $3"#,
        )
        .bind(token_digest)
        .bind(expires)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Drop any pending reset token.
    pub async fn clear_reset_token(&self, user_id: Uuid) -> Result<()> {
        sqlx::query(
            r#"UPDATE users SET reset_token = NULL, reset_expires = NULL WHERE id = $1"#,
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
