//! Users-related HTTP API: accounts, profiles and their sub-resources.

pub mod accommodation;
pub mod create;
pub mod forgot;
mod get;
pub mod login;
mod logout;
mod password;
pub mod reset;
mod update;

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{HeaderMap, header};
use axum::response::Response;
use axum::routing::{get, patch, post};
use axum::{Router, middleware};
use uuid::Uuid;

use crate::token::EXPIRATION_TIME;
use crate::user::{UserBuilder, UserService};
use crate::{AppState, ServerError};

const BEARER: &str = "Bearer ";
const COOKIE_NAME: &str = "jwt";
const LOGGED_OUT: &str = "loggedout";

/// `Set-Cookie` value mirroring the issued token.
pub(crate) fn session_cookie(token: &str) -> String {
    format!("{COOKIE_NAME}={token}; Path=/; HttpOnly; Max-Age={EXPIRATION_TIME}")
}

/// `Set-Cookie` value clearing the session.
pub(crate) fn expired_cookie() -> String {
    format!("{COOKIE_NAME}={LOGGED_OUT}; Path=/; HttpOnly; Max-Age=10")
}

/// Token from the `Authorization` header, falling back to the session
/// cookie.
fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    if let Some(authorization) = headers
        .get(header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
    {
        return Some(authorization.replace(BEARER, ""));
    }

    headers
        .get(header::COOKIE)
        .and_then(|header| header.to_str().ok())?
        .split(';')
        .find_map(|cookie| cookie.trim().strip_prefix("jwt="))
        .filter(|value| *value != LOGGED_OUT)
        .map(str::to_owned)
}

/// Custom middleware for authentification.
async fn auth(
    State(state): State<AppState>,
    mut req: Request,
    next: middleware::Next,
) -> Result<Response, ServerError> {
    let token = token_from_headers(req.headers()).ok_or(ServerError::Unauthorized)?;
    let claims = state
        .token
        .decode(&token)
        .map_err(|_| ServerError::Unauthorized)?;
    let user_id =
        Uuid::parse_str(&claims.sub).map_err(|_| ServerError::Unauthorized)?;

    let user = UserBuilder::new()
        .id(user_id)
        .build(state.db.postgres.clone(), Arc::clone(&state.crypto))
        .find_by_id()
        .await
        .map_err(|_| ServerError::Unauthorized)?;

    // A token issued before the password changed is no longer honored.
    if user.data.changed_password_after(claims.iat) {
        return Err(ServerError::Unauthorized);
    }

    req.extensions_mut().insert::<UserService>(user);
    Ok(next.run(req).await)
}

pub fn router(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        // `GET /me` goes to the caller's profile.
        .route("/me", get(get::handler))
        // `PATCH /updateMe` updates profile fields.
        .route("/updateMe", patch(update::handler))
        // `PATCH /updateMyPassword` rotates the password.
        .route("/updateMyPassword", patch(password::handler))
        // `POST /newAccommodation` publishes a listing.
        .route("/newAccommodation", post(accommodation::create))
        // `GET /myAccommodation` lists the caller's properties.
        .route("/myAccommodation", get(accommodation::mine))
        // `POST /checkout-session` creates a payment intent.
        .route("/checkout-session", post(super::checkout::handler))
        // `GET /booking` lists the caller's bookings.
        .route("/booking", get(super::bookings::list::handler))
        // `POST /booking/new` admits and records a booking.
        .route("/booking/new", post(super::bookings::create::handler))
        // `GET /booking/{booking_id}` shows one booking.
        .route("/booking/{booking_id}", get(super::bookings::get::handler))
        .route_layer(middleware::from_fn_with_state(state, auth));

    Router::new()
        // `POST /signup` creates an account.
        .route("/signup", post(create::handler))
        // `POST /login` exchanges credentials for a token.
        .route("/login", post(login::handler))
        // `GET /logout` clears the session cookie.
        .route("/logout", get(logout::handler))
        // `POST /forgotPassword` issues a reset token by mail.
        .route("/forgotPassword", post(forgot::handler))
        // `PATCH /resetPassword/{token}` redeems a reset token.
        .route("/resetPassword/{token}", patch(reset::handler))
        .merge(protected)
}
