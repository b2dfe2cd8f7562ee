//! One listing by id.

use axum::Json;
use axum::extract::{Path, State};
use uuid::Uuid;

use crate::AppState;
use crate::error::Result;
use crate::property::{Property, PropertyRepository};

pub async fn handler(
    State(state): State<AppState>,
    Path(property_id): Path<Uuid>,
) -> Result<Json<Property>> {
    let property = PropertyRepository::new(state.db.postgres.clone())
        .find_by_id(property_id)
        .await?;

    Ok(Json(property))
}
