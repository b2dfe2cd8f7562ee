//! The caller's bookings.

use axum::extract::State;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::booking::{Booking, BookingRepository};
use crate::error::Result;
use crate::user::UserService;

#[derive(Debug, Serialize, Deserialize)]
pub struct Response {
    pub results: usize,
    pub bookings: Vec<Booking>,
}

pub async fn handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserService>,
) -> Result<Json<Response>> {
    let bookings = BookingRepository::new(state.db.postgres.clone())
        .find_by_user(user.data.id)
        .await?;

    Ok(Json(Response {
        results: bookings.len(),
        bookings,
    }))
}
