//! Get the caller's profile.

use axum::{Extension, Json};

use crate::user::{User, UserService};

pub async fn handler(Extension(user): Extension<UserService>) -> Json<User> {
    Json(user.data)
}
