//! The filtered, searched and paginated storefront.

use axum::Json;
use axum::extract::{Query, State};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::error::Result;
use crate::property::filter::{ListingFilter, ListingParams};
use crate::property::{Property, PropertyRepository};

#[derive(Debug, Serialize, Deserialize)]
pub struct Response {
    /// Listings on this page.
    pub results: usize,
    /// Size of the whole collection, unfiltered.
    pub total: i64,
    pub data: Vec<Property>,
}

pub async fn handler(
    State(state): State<AppState>,
    Query(params): Query<ListingParams>,
) -> Result<Json<Response>> {
    let filter = ListingFilter::from_params(&params);

    let (properties, total) = PropertyRepository::new(state.db.postgres.clone())
        .list(&filter)
        .await?;

    Ok(Json(Response {
        results: properties.len(),
        total,
        data: properties,
    }))
}
