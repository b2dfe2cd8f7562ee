use std::sync::Arc;

use chrono::{Duration, Utc};
use sqlx::{Pool, Postgres};

use crate::crypto::{Crypto, generate_reset_token};
use crate::error::Result;
use crate::user::{User, UserRepository};

/// How long a password-reset token stays redeemable.
pub const RESET_TOKEN_TTL_MINUTES: i64 = 10;

/// User manager.
#[derive(Clone)]
pub struct UserService {
    pub repo: UserRepository,
    pub crypto: Arc<Crypto>,
    pub data: User,
}

impl UserService {
    /// Create a new [`UserService`].
    pub fn new(user: User, pool: Pool<Postgres>, crypto: Arc<Crypto>) -> Self {
        Self {
            data: user,
            repo: UserRepository::new(pool),
            crypto,
        }
    }

    /// Create builded user: hash the password, then persist.
    pub async fn create_user(mut self) -> Result<Self> {
        self.data.password = self
            .crypto
            .pwd
            .hash_password(&self.data.password)
            .map_err(|err| crate::error::ServerError::Internal {
                details: "password hashing failed".into(),
                source: Some(Box::new(err)),
            })?;

        self.repo.insert(&self.data).await?;
        Ok(self)
    }

    /// Find current user using `id` field.
    pub async fn find_by_id(mut self) -> Result<Self> {
        self.data = self.repo.find_by_id(self.data.id).await?;
        Ok(self)
    }

    /// Find current user using `email` field.
    pub async fn find_by_email(mut self) -> Result<Self> {
        self.data = self.repo.find_by_email(&self.data.email).await?;
        Ok(self)
    }

    /// Update current user's profile.
    pub async fn update(&self) -> Result<()> {
        self.repo.update(&self.data).await
    }

    /// Set a new password; outstanding tokens stop being honored.
    pub async fn update_password(&self, new_password: &str) -> Result<()> {
        let phc_hash = self
            .crypto
            .pwd
            .hash_password(new_password)
            .map_err(|err| crate::error::ServerError::Internal {
                details: "password hashing failed".into(),
                source: Some(Box::new(err)),
            })?;

        self.repo.update_password(self.data.id, &phc_hash).await
    }

    /// Issue a password-reset token: persist its digest with a short
    /// expiry and return the clear token to be mailed.
    pub async fn issue_reset_token(&self) -> Result<String> {
        let token = generate_reset_token();
        let digest = self.crypto.hasher.digest(&token);
        let expires = Utc::now() + Duration::minutes(RESET_TOKEN_TTL_MINUTES);

        self.repo
            .set_reset_token(self.data.id, &digest, expires)
            .await?;
        Ok(token)
    }

    /// Drop any reset token issued for this user.
    pub async fn revoke_reset_token(&self) -> Result<()> {
        self.repo.clear_reset_token(self.data.id).await
    }
}
