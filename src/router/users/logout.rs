//! Clear the session cookie.

use axum::Json;
use axum::http::header;
use serde::Serialize;

use crate::router::users::expired_cookie;

#[derive(Debug, Serialize)]
pub struct Response {
    status: &'static str,
}

pub async fn handler() -> ([(header::HeaderName, String); 1], Json<Response>) {
    (
        [(header::SET_COOKIE, expired_cookie())],
        Json(Response { status: "success" }),
    )
}
