//! HTTP API surface.

pub mod bookings;
pub mod checkout;
pub mod listing;
pub mod status;
pub mod users;

use std::sync::LazyLock;

use axum::Json;
use axum::extract::{FromRequest, Request};
use regex_lite::Regex;
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationError};

use crate::ServerError;

static TIME_OF_DAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([01][0-9]|2[0-3]):[0-5][0-9]$").expect("time regex compiles")
});

/// JSON body extractor running `validator` checks before the handler.
pub struct Valid<T>(pub T);

impl<S, T> FromRequest<S> for Valid<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate + Send,
{
    type Rejection = ServerError;

    async fn from_request(
        req: Request,
        state: &S,
    ) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        value.validate()?;
        Ok(Self(value))
    }
}

/// Reject passwords made of letters only.
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.chars().all(|c| c.is_alphabetic()) {
        return Err(ValidationError::new("weak_password"));
    }

    Ok(())
}

/// Check-in/check-out times are 24-hour `HH:MM` strings.
pub fn validate_time_of_day(value: &str) -> Result<(), ValidationError> {
    if !TIME_OF_DAY.is_match(value) {
        return Err(ValidationError::new("invalid_time"));
    }

    Ok(())
}

/// Asset references must be absolute URLs.
pub fn validate_url(value: &str) -> Result<(), ValidationError> {
    url::Url::parse(value)
        .map(drop)
        .map_err(|_| ValidationError::new("invalid_url"))
}

/// MUST NEVER be used in production.
#[cfg(test)]
pub fn state(pool: sqlx::PgPool) -> crate::AppState {
    use std::sync::Arc;

    let mut config = crate::config::Configuration::default();
    config.name = "renta.test".into();
    config.url = "https://renta.test".into();
    config.frontend_url = Some("http://localhost:3000".into());

    // Cheap argon2 parameters keep handler tests fast.
    let argon2 = crate::config::Argon2 {
        memory_cost: 1024,
        iterations: 1,
        parallelism: 1,
        hash_length: 32,
    };

    crate::AppState {
        config: Arc::new(config),
        db: crate::database::Database { postgres: pool },
        crypto: Arc::new(
            crate::crypto::Crypto::new(Some(argon2), b"test-pepper")
                .expect("valid argon2 parameters"),
        ),
        token: crate::token::TokenManager::new("renta.test", "test-secret"),
        mail: crate::mail::MailManager::default(),
        payment: crate::payment::PaymentClient::default(),
        metrics: None,
    }
}
