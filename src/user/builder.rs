//! Typed builder for User.

use std::sync::Arc;

use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::crypto::Crypto;
use crate::user::{DEFAULT_AVATAR, User, UserService};

/// [`User`] builder.
#[derive(Debug, Clone)]
pub struct UserBuilder<Id, Email> {
    id: Id,
    name: String,
    email: Email,
    phone_number: Option<String>,
    password: String,
    avatar: Option<String>,
}

/// Value is missing on [`UserBuilder`].
#[derive(Debug, Clone)]
pub struct Missing;

/// Value is present on [`UserBuilder`].
#[derive(Debug, Clone)]
pub struct Present<T>(pub T);

impl UserBuilder<Missing, Missing> {
    /// Create a new [`UserBuilder`].
    pub fn new() -> Self {
        Self {
            id: Missing,
            name: String::default(),
            email: Missing,
            phone_number: None,
            password: String::default(),
            avatar: None,
        }
    }
}

impl Default for UserBuilder<Missing, Missing> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Email> UserBuilder<Missing, Email> {
    /// Update `id` field on [`UserBuilder`].
    pub fn id(self, id: Uuid) -> UserBuilder<Present<Uuid>, Email> {
        UserBuilder {
            id: Present(id),
            name: self.name,
            email: self.email,
            phone_number: self.phone_number,
            password: self.password,
            avatar: self.avatar,
        }
    }
}

impl<Id> UserBuilder<Id, Missing> {
    /// Update `email` field on [`UserBuilder`].
    pub fn email(
        self,
        email: impl Into<String>,
    ) -> UserBuilder<Id, Present<String>> {
        UserBuilder {
            id: self.id,
            name: self.name,
            email: Present(email.into().to_lowercase()),
            phone_number: self.phone_number,
            password: self.password,
            avatar: self.avatar,
        }
    }
}

impl<Id, Email> UserBuilder<Id, Email> {
    /// Update `name` field on [`UserBuilder`].
    pub fn name(mut self, name: impl ToString) -> Self {
        self.name = name.to_string();
        self
    }

    /// Update `phone_number` field on [`UserBuilder`].
    pub fn phone_number(mut self, phone_number: Option<String>) -> Self {
        self.phone_number = phone_number;
        self
    }

    /// Update `password` field on [`UserBuilder`].
    pub fn password(mut self, password: impl ToString) -> Self {
        self.password = password.to_string();
        self
    }

    /// Update `avatar` field on [`UserBuilder`].
    pub fn avatar(mut self, avatar: Option<String>) -> Self {
        self.avatar = avatar;
        self
    }

    fn into_user(self, id: Uuid, email: String) -> User {
        User {
            id,
            name: self.name,
            email,
            phone_number: self.phone_number,
            avatar: self.avatar.unwrap_or_else(|| DEFAULT_AVATAR.to_owned()),
            password: self.password,
            password_changed_at: None,
            reset_token: None,
            reset_expires: None,
            created_at: chrono::Utc::now(),
        }
    }
}

impl UserBuilder<Missing, Present<String>> {
    /// Build a [`User`] with `email`; a fresh id is generated.
    pub fn build(
        self,
        pool: Pool<Postgres>,
        crypto: Arc<Crypto>,
    ) -> UserService {
        let email = self.email.0.clone();
        let user = self.into_user(Uuid::new_v4(), email);

        UserService::new(user, pool, crypto)
    }
}

impl UserBuilder<Present<Uuid>, Missing> {
    /// Build a [`User`] with `id`.
    pub fn build(
        self,
        pool: Pool<Postgres>,
        crypto: Arc<Crypto>,
    ) -> UserService {
        let id = self.id.0;
        let user = self.into_user(id, String::default());

        UserService::new(user, pool, crypto)
    }
}
