//! Publish and list the caller's properties.

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::AppState;
use crate::error::Result;
use crate::property::{
    Address, Amenity, DEFAULT_CHECK_IN_TIME, DEFAULT_CHECK_OUT_TIME, Image,
    Property, PropertyRepository, PropertyType, RoomType, slugify,
};
use crate::router::Valid;
use crate::user::UserService;

/// Nightly price applied when the host does not set one.
const DEFAULT_PRICE: i64 = 500;

fn default_price() -> i64 {
    DEFAULT_PRICE
}

fn default_check_in() -> String {
    DEFAULT_CHECK_IN_TIME.to_owned()
}

fn default_check_out() -> String {
    DEFAULT_CHECK_OUT_TIME.to_owned()
}

#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Body {
    #[serde(rename = "propertyName")]
    #[validate(length(min = 1, max = 100, message = "Property name is required."))]
    pub name: String,
    #[validate(length(min = 1, message = "Description is required."))]
    pub description: String,
    pub extra_info: Option<String>,
    #[serde(default)]
    pub property_type: PropertyType,
    #[serde(default)]
    pub room_type: RoomType,
    #[serde(rename = "maximumGuest")]
    #[validate(range(min = 1, message = "At least one guest must fit."))]
    pub max_guests: i32,
    #[serde(default)]
    pub amenities: Vec<Amenity>,
    #[validate(length(
        min = 5,
        message = "The images array must contain at least 5 images."
    ))]
    pub images: Vec<Image>,
    #[serde(default = "default_price")]
    #[validate(range(min = 1, message = "Nightly price must be positive."))]
    pub price: i64,
    #[serde(default)]
    pub address: Address,
    #[serde(default = "default_check_in")]
    #[validate(custom(
        function = "crate::router::validate_time_of_day",
        message = "Check-in time must be HH:MM."
    ))]
    pub check_in_time: String,
    #[serde(default = "default_check_out")]
    #[validate(custom(
        function = "crate::router::validate_time_of_day",
        message = "Check-out time must be HH:MM."
    ))]
    pub check_out_time: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ListResponse {
    pub results: usize,
    pub data: Vec<Property>,
}

/// Handler to publish a listing.
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<UserService>,
    Valid(body): Valid<Body>,
) -> Result<(StatusCode, Json<Property>)> {
    let property = Property {
        id: Uuid::new_v4(),
        slug: slugify(&body.name),
        name: body.name,
        description: body.description,
        extra_info: body.extra_info,
        property_type: body.property_type,
        room_type: body.room_type,
        max_guests: body.max_guests,
        amenities: body.amenities,
        images: body.images,
        price: body.price,
        // Searchable address parts are stored normalized.
        address: body.address.normalized(),
        current_bookings: Vec::new(),
        owner_id: user.data.id,
        check_in_time: body.check_in_time,
        check_out_time: body.check_out_time,
        created_at: Utc::now(),
    };

    PropertyRepository::new(state.db.postgres.clone())
        .insert(&property)
        .await?;

    Ok((StatusCode::CREATED, Json(property)))
}

/// Handler to list the caller's properties.
pub async fn mine(
    State(state): State<AppState>,
    Extension(user): Extension<UserService>,
) -> Result<Json<ListResponse>> {
    let properties = PropertyRepository::new(state.db.postgres.clone())
        .find_by_owner(user.data.id)
        .await?;

    Ok(Json(ListResponse {
        results: properties.len(),
        data: properties,
    }))
}
