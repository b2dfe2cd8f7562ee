//! Rotate the caller's password.

use axum::extract::State;
use axum::http::header;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use validator::Validate;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::Result;
use crate::router::Valid;
use crate::router::users::create::{Response, TOKEN_TYPE};
use crate::router::users::session_cookie;
use crate::user::UserService;
use crate::{AppState, token};

#[derive(Debug, Serialize, Deserialize, Validate, Zeroize, ZeroizeOnDrop)]
#[serde(rename_all = "camelCase")]
pub struct Body {
    #[validate(length(
        min = 8,
        message = "Password must contain at least 8 characters."
    ))]
    pub password_current: String,
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

pub async fn handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserService>,
    Valid(body): Valid<Body>,
) -> Result<([(header::HeaderName, String); 1], Json<Response>)> {
    state
        .crypto
        .pwd
        .verify_password(&body.password_current, &user.data.password)?;

    user.update_password(&body.password).await?;

    // The stamp above invalidates older tokens, so hand out a fresh one.
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
    use crate::router::users::create::tests::signup_body;
    use crate::*;
    use axum::http::{Method, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::json;
    use sqlx::{Pool, Postgres};

    #[sqlx::test]
    async fn test_password_rotation_invalidates_old_token(pool: Pool<Postgres>) {
        let state = router::state(pool);
        let app = app(state);

        let response = make_request(
            None,
            app.clone(),
            Method::POST,
            "/api/v1/rent/user/signup",
            signup_body("Asha Rao", "asha@example.org", "P$soW%920$n&").to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let signup: router::users::create::Response =
            serde_json::from_slice(&body).unwrap();

        // Tokens carry second-granularity timestamps; make sure the
        // password change lands strictly after the signup token.
        tokio::time::sleep(std::time::Duration::from_millis(1100)).await;

        let response = make_request_with_token(
            &signup.token,
            app.clone(),
            Method::PATCH,
            "/api/v1/rent/user/updateMyPassword",
            json!({
                "passwordCurrent": "P$soW%920$n&",
                "password": "N3w-P$ssword!",
                "passwordConfirm": "N3w-P$ssword!",
            })
            .to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let rotated: router::users::create::Response =
            serde_json::from_slice(&body).unwrap();

        // The pre-rotation token is no longer honored, the fresh one is.
        let response = make_request_with_token(
            &signup.token,
            app.clone(),
            Method::GET,
            "/api/v1/rent/user/me",
            String::default(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = make_request_with_token(
            &rotated.token,
            app,
            Method::GET,
            "/api/v1/rent/user/me",
            String::default(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[sqlx::test]
    async fn test_password_rotation_needs_current_password(pool: Pool<Postgres>) {
        let state = router::state(pool);
        let app = app(state);

        let response = make_request(
            None,
            app.clone(),
            Method::POST,
            "/api/v1/rent/user/signup",
            signup_body("Asha Rao", "asha@example.org", "P$soW%920$n&").to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let signup: router::users::create::Response =
            serde_json::from_slice(&body).unwrap();

        let response = make_request_with_token(
            &signup.token,
            app,
            Method::PATCH,
            "/api/v1/rent/user/updateMyPassword",
            json!({
                "passwordCurrent": "Wrong-pass1",
                "password": "N3w-P$ssword!",
                "passwordConfirm": "N3w-P$ssword!",
            })
            .to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
