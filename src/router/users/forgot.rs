//! Issue a password-reset token by mail.

use std::sync::Arc;

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::AppState;
use crate::error::Result;
use crate::mail::Template::PasswordReset;
use crate::router::Valid;
use crate::user::UserBuilder;

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct Body {
    #[validate(email(message = "Email must be formatted."))]
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Response {
    pub message: &'static str,
}

/// Handler to start the reset flow. The clear token only travels by mail;
/// the database keeps its digest.
pub async fn handler(
    State(state): State<AppState>,
    Valid(body): Valid<Body>,
) -> Result<Json<Response>> {
    let user = UserBuilder::new()
        .email(&body.email)
        .build(state.db.postgres.clone(), Arc::clone(&state.crypto))
        .find_by_email()
        .await?;

    let token = user.issue_reset_token().await?;

    let base = state
        .config
        .frontend_url
        .clone()
        .unwrap_or_else(|| state.config.url.clone());
    let reset_url = format!(
        "{}/user/resetPassword/{token}",
        base.trim_end_matches('/'),
    );

    if let Err(err) = state
        .mail
        .publish_event(PasswordReset, &user.data.email, &user.data.name, Some(reset_url))
        .await
    {
        // Do not leave a redeemable token behind when the mail never left.
        user.revoke_reset_token().await?;
        return Err(err);
    }

    Ok(Json(Response {
        message: "Token sent to email",
    }))
}

#[cfg(test)]
mod tests {
    use crate::*;
    use axum::http::{Method, StatusCode};
    use serde_json::json;
    use sqlx::{Pool, Postgres};

    #[sqlx::test(fixtures("../../../fixtures/users.sql"))]
    async fn test_forgot_password_acknowledges(pool: Pool<Postgres>) {
        let state = router::state(pool);
        let app = app(state);

        let response = make_request(
            None,
            app,
            Method::POST,
            "/api/v1/rent/user/forgotPassword",
            json!({ "email": "admin@renta.test" }).to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[sqlx::test(fixtures("../../../fixtures/users.sql"))]
    async fn test_forgot_password_unknown_email(pool: Pool<Postgres>) {
        let state = router::state(pool);
        let app = app(state);

        let response = make_request(
            None,
            app,
            Method::POST,
            "/api/v1/rent/user/forgotPassword",
            json!({ "email": "ghost@renta.test" }).to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
