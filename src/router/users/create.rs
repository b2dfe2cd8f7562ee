use std::sync::Arc;

use axum::http::{StatusCode, header};
use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::AppState;
use crate::error::Result;
use crate::mail::Template::Welcome;
use crate::router::Valid;
use crate::router::users::session_cookie;
use crate::user::{User, UserBuilder};

pub const TOKEN_TYPE: &str = "Bearer";

#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Body {
    #[validate(length(min = 2, max = 50, message = "Name must be 2 to 50 characters long."))]
    pub name: String,
    #[validate(email(message = "Email must be formatted."))]
    pub email: String,
    #[validate(length(
        min = 7,
        max = 20,
        message = "Phone number must be 7 to 20 characters long."
    ))]
    pub phone_number: Option<String>,
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
    #[validate(custom(
        function = "crate::router::validate_url",
        message = "Avatar must be a URL."
    ))]
    pub avatar: Option<String>,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub token_type: String,
    pub token: String,
    pub expires_in: u64,
    pub user: User,
}

/// Handler to create user.
pub async fn handler(
    State(state): State<AppState>,
    Valid(body): Valid<Body>,
) -> Result<(StatusCode, [(header::HeaderName, String); 1], Json<Response>)> {
    let user = UserBuilder::new()
        .email(&body.email)
        .name(&body.name)
        .phone_number(body.phone_number)
        .password(&body.password)
        .avatar(body.avatar)
        .build(state.db.postgres.clone(), Arc::clone(&state.crypto))
        .create_user()
        .await?;

    state
        .mail
        .publish_event(Welcome, &user.data.email, &user.data.name, None)
        .await?;

    let token = state.token.create(&user.data.id.to_string())?;

    Ok((
        StatusCode::CREATED,
        [(header::SET_COOKIE, session_cookie(&token))],
        Json(Response {
            token_type: TOKEN_TYPE.to_owned(),
            token,
            expires_in: crate::token::EXPIRATION_TIME,
            user: user.data,
        }),
    ))
}

#[cfg(test)]
pub(super) mod tests {
    use super::*;
    use crate::*;
    use axum::http::{Method, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::json;
    use sqlx::{Pool, Postgres};
    use std::time::{SystemTime, UNIX_EPOCH};

    pub(crate) fn signup_body(name: &str, email: &str, password: &str) -> serde_json::Value {
        json!({
            "name": name,
            "email": email,
            "password": password,
            "passwordConfirm": password,
        })
    }

    #[sqlx::test]
    async fn test_signup_handler(pool: Pool<Postgres>) {
        let state = router::state(pool);
        let app = app(state.clone());

        let response = make_request(
            None,
            app,
            Method::POST,
            "/api/v1/rent/user/signup",
            signup_body("Asha Rao", "asha@example.org", "P$soW%920$n&").to_string(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::CREATED);

        let cookie = response
            .headers()
            .get(axum::http::header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_owned();
        assert!(cookie.starts_with("jwt="));
        assert!(cookie.contains("HttpOnly"));

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: Response = serde_json::from_slice(&body).unwrap();
        assert_eq!(body.token_type, TOKEN_TYPE);
        assert_eq!(body.expires_in, crate::token::EXPIRATION_TIME);
        assert_eq!(body.user.email, "asha@example.org");

        let claims = state.token.decode(&body.token).unwrap();
        assert_eq!(claims.sub, body.user.id.to_string());
        let time = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs();
        assert!(claims.exp > time);
    }

    #[sqlx::test]
    async fn test_signup_with_weak_password(pool: Pool<Postgres>) {
        let state = router::state(pool);
        let app = app(state);

        let response = make_request(
            None,
            app,
            Method::POST,
            "/api/v1/rent/user/signup",
            signup_body("Asha Rao", "asha2@example.org", "onlyletters").to_string(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[sqlx::test]
    async fn test_signup_with_mismatched_confirmation(pool: Pool<Postgres>) {
        let state = router::state(pool);
        let app = app(state);

        let mut body = signup_body("Asha Rao", "asha3@example.org", "P$soW%920$n&");
        body["passwordConfirm"] = json!("Different1!");
        let response = make_request(
            None,
            app,
            Method::POST,
            "/api/v1/rent/user/signup",
            body.to_string(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[sqlx::test]
    async fn test_signup_duplicate_email_conflicts(pool: Pool<Postgres>) {
        let state = router::state(pool);
        let app = app(state);

        let body = signup_body("Asha Rao", "asha4@example.org", "P$soW%920$n&");
        let response = make_request(
            None,
            app.clone(),
            Method::POST,
            "/api/v1/rent/user/signup",
            body.to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = make_request(
            None,
            app,
            Method::POST,
            "/api/v1/rent/user/signup",
            body.to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}
