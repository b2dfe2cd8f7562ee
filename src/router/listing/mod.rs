//! Listings-related HTTP API, the public storefront.

mod get;
pub mod list;

use axum::Router;
use axum::routing::get;

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        // `GET /` goes to the filtered, paginated list.
        .route("/", get(list::handler))
        // `GET /{id}` goes to a single listing.
        .route("/{id}", get(get::handler))
}
