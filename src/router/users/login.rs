use std::sync::Arc;

use axum::http::header;
use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::AppState;
use crate::error::Result;
use crate::router::Valid;
use crate::router::users::create::{Response, TOKEN_TYPE};
use crate::router::users::session_cookie;
use crate::user::UserBuilder;

/// One message whether the account is unknown or the password wrong.
fn invalid_credentials() -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    errors.add(
        "email",
        ValidationError::new("invalid_credentials")
            .with_message("Incorrect email or password.".into()),
    );
    errors
}

#[derive(Debug, Serialize, Deserialize, Validate, Zeroize, ZeroizeOnDrop)]
pub struct Body {
    #[validate(email(message = "Email must be formatted."))]
    pub email: String,
    #[validate(length(
        min = 8,
        message = "Password must contain at least 8 characters."
    ))]
    pub password: String,
}

/// Handler to exchange credentials for a token.
pub async fn handler(
    State(state): State<AppState>,
    Valid(body): Valid<Body>,
) -> Result<([(header::HeaderName, String); 1], Json<Response>)> {
    let user = UserBuilder::new()
        .email(&body.email)
        .build(state.db.postgres.clone(), Arc::clone(&state.crypto))
        .find_by_email()
        .await
        .map_err(|_| invalid_credentials())?;

    state
        .crypto
        .pwd
        .verify_password(&body.password, &user.data.password)
        .map_err(|_| invalid_credentials())?;

    let token = state.token.create(&user.data.id.to_string())?;

    Ok((
        [(header::SET_COOKIE, session_cookie(&token))],
        Json(Response {
            token_type: TOKEN_TYPE.to_owned(),
            token,
            expires_in: crate::token::EXPIRATION_TIME,
            user: user.data,
        }),
    ))
}
