//! One booking, scoped to its owner.

use axum::extract::{Path, State};
use axum::{Extension, Json};
use uuid::Uuid;

use crate::AppState;
use crate::booking::{Booking, BookingRepository};
use crate::error::Result;
use crate::user::UserService;

pub async fn handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserService>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<Booking>> {
    let booking = BookingRepository::new(state.db.postgres.clone())
        .find_for_user(booking_id, user.data.id)
        .await?;

    Ok(Json(booking))
}
