//! Redeem a password-reset token.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::header;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::Result;
use crate::router::Valid;
use crate::router::users::create::{Response, TOKEN_TYPE};
use crate::router::users::session_cookie;
use crate::user::{UserRepository, UserService};
use crate::{AppState, token};

fn invalid_token() -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    errors.add(
        "token",
        ValidationError::new("invalid_token")
            .with_message("Token is invalid or expired.".into()),
    );
    errors
}

#[derive(Debug, Serialize, Deserialize, Validate, Zeroize, ZeroizeOnDrop)]
#[serde(rename_all = "camelCase")]
pub struct Body {
    #[validate(
        length(
            min = 8,
            max = 255,
            message = "Password must contain at least 8 characters."
        ),
        custom(
            function = "crate::router::validate_password",
            message = "Password is too weak."
        )
    )]
    pub password: String,
    #[validate(must_match(other = "password", message = "Passwords do not match."))]
    pub password_confirm: String,
}

/// Handler to redeem a mailed reset token. Only its digest is compared.
pub async fn handler(
    State(state): State<AppState>,
    Path(reset_token): Path<String>,
    Valid(body): Valid<Body>,
) -> Result<([(header::HeaderName, String); 1], Json<Response>)> {
    let digest = state.crypto.hasher.digest(&reset_token);

    let repo = UserRepository::new(state.db.postgres.clone());
    let user = repo
        .find_by_reset_token(&digest, Utc::now())
        .await?
        .ok_or_else(invalid_token)?;

    let user = UserService::new(
        user,
        state.db.postgres.clone(),
        Arc::clone(&state.crypto),
    );
    user.update_password(&body.password).await?;

    let token = state.token.create(&user.data.id.to_string())?;

    Ok((
        [(header::SET_COOKIE, session_cookie(&token))],
        Json(Response {
            token_type: TOKEN_TYPE.to_owned(),
            token,
            expires_in: token::EXPIRATION_TIME,
            user: user.data,
        }),
    ))
}

#[cfg(test)]
mod tests {
    use crate::*;
    use axum::http::{Method, StatusCode};
    use serde_json::json;
    use sqlx::{Pool, Postgres};

    #[sqlx::test(fixtures("../../../fixtures/users.sql"))]
    async fn test_reset_with_unknown_token(pool: Pool<Postgres>) {
        let state = router::state(pool);
        let app = app(state);

        let response = make_request(
            None,
            app,
            Method::PATCH,
            "/api/v1/rent/user/resetPassword/deadbeef",
            json!({
                "password": "N3w-P$ssword!",
                "passwordConfirm": "N3w-P$ssword!",
            })
            .to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[sqlx::test(fixtures("../../../fixtures/users.sql"))]
    async fn test_issued_token_redeems_once(pool: Pool<Postgres>) {
        let state = router::state(pool.clone());
        let app = app(state.clone());

        // Issue a token straight through the service, as the mail flow
        // would, so the clear value is known to the test.
        let user = user::UserBuilder::new()
            .id(TEST_USER_ID.parse().unwrap())
            .build(pool, std::sync::Arc::clone(&state.crypto))
            .find_by_id()
            .await
            .unwrap();
        let clear_token = user.issue_reset_token().await.unwrap();

        let body = json!({
            "password": "N3w-P$ssword!",
            "passwordConfirm": "N3w-P$ssword!",
        })
        .to_string();

        let path = format!("/api/v1/rent/user/resetPassword/{clear_token}");
        let response =
            make_request(None, app.clone(), Method::PATCH, &path, body.clone()).await;
        assert_eq!(response.status(), StatusCode::OK);

        // Redemption consumed the token.
        let response = make_request(None, app, Method::PATCH, &path, body).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
