//! Admit and record a booking.

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::AppState;
use crate::booking::{Booking, BookingRepository, DateRange};
use crate::error::Result;
use crate::mail::Template::BookingConfirmed;
use crate::property::{Property, PropertyRepository};
use crate::router::Valid;
use crate::user::UserService;

fn invalid_range() -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    errors.add(
        "toDate",
        ValidationError::new("invalid_range")
            .with_message("Stay must be at least one night.".into()),
    );
    errors
}

#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Body {
    pub property: Uuid,
    #[validate(range(min = 0, message = "Price cannot be negative."))]
    pub price: i64,
    #[validate(range(min = 1, message = "At least one guest is required."))]
    pub guests: i32,
    pub from_date: DateTime<Utc>,
    pub to_date: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Response {
    pub booking: Booking,
    pub property: Property,
}

pub async fn handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserService>,
    Valid(body): Valid<Body>,
) -> Result<(StatusCode, Json<Response>)> {
    let range = DateRange::new(body.from_date, body.to_date);
    if range.nights() < 1 {
        return Err(invalid_range().into());
    }

    let booking = BookingRepository::new(state.db.postgres.clone())
        .create(body.property, user.data.id, body.guests, body.price, range)
        .await?;

    let property = PropertyRepository::new(state.db.postgres.clone())
        .find_by_id(body.property)
        .await?;

    // The booking is committed; a missed mail event must not undo it.
    if let Err(err) = state
        .mail
        .publish_event(BookingConfirmed, &user.data.email, &user.data.name, None)
        .await
    {
        tracing::error!(
            booking_id = %booking.id,
            error = %err,
            "booking confirmation mail not published"
        );
    }

    Ok((StatusCode::CREATED, Json(Response { booking, property })))
}

#[cfg(test)]
mod tests {
    use crate::router::users::accommodation::tests::listing_body;
    use crate::*;
    use axum::http::{Method, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::json;
    use sqlx::{Pool, Postgres};

    async fn create_listing(state: &AppState, app: axum::Router) -> uuid::Uuid {
        let response = make_request(
            Some(state),
            app,
            Method::POST,
            "/api/v1/rent/user/newAccommodation",
            listing_body("Cozy Beach House", "Goa", 1200).to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let property: property::Property = serde_json::from_slice(&body).unwrap();
        property.id
    }

    fn booking_body(property: uuid::Uuid, from: &str, to: &str) -> String {
        json!({
            "property": property,
            "price": 4800,
            "guests": 2,
            "fromDate": format!("{from}T00:00:00Z"),
            "toDate": format!("{to}T00:00:00Z"),
        })
        .to_string()
    }

    #[sqlx::test(fixtures("../../../fixtures/users.sql"))]
    async fn test_booking_round_trip(pool: Pool<Postgres>) {
        let state = router::state(pool);
        let app = app(state.clone());
        let property = create_listing(&state, app.clone()).await;

        let response = make_request(
            Some(&state),
            app.clone(),
            Method::POST,
            "/api/v1/rent/user/booking/new",
            booking_body(property, "2024-06-05", "2024-06-10"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: super::Response = serde_json::from_slice(&body).unwrap();
        let booking_id = body.booking.id;
        assert_eq!(body.booking.nights, 5);
        assert_eq!(body.property.current_bookings.len(), 1);
        assert_eq!(body.property.current_bookings[0].booking_id, booking_id);

        // The booked property must drop out of availability search for an
        // overlapping window, and stay in for a disjoint one.
        let response = make_request(
            None,
            app.clone(),
            Method::GET,
            "/api/v1/rent/listing?dateIn=2024-06-08&dateOut=2024-06-12",
            String::default(),
        )
        .await;
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: router::listing::list::Response =
            serde_json::from_slice(&body).unwrap();
        assert_eq!(body.results, 0);

        let response = make_request(
            None,
            app.clone(),
            Method::GET,
            "/api/v1/rent/listing?dateIn=2024-06-20&dateOut=2024-06-25",
            String::default(),
        )
        .await;
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: router::listing::list::Response =
            serde_json::from_slice(&body).unwrap();
        assert_eq!(body.results, 1);

        // The booking shows up under the caller's bookings.
        let response = make_request(
            Some(&state),
            app.clone(),
            Method::GET,
            "/api/v1/rent/user/booking",
            String::default(),
        )
        .await;
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: router::bookings::list::Response =
            serde_json::from_slice(&body).unwrap();
        assert_eq!(body.results, 1);

        // And is retrievable by id, scoped to the caller.
        let response = make_request(
            Some(&state),
            app,
            Method::GET,
            &format!("/api/v1/rent/user/booking/{booking_id}"),
            String::default(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[sqlx::test(fixtures("../../../fixtures/users.sql"))]
    async fn test_booking_shared_boundary_day_conflicts(pool: Pool<Postgres>) {
        let state = router::state(pool);
        let app = app(state.clone());
        let property = create_listing(&state, app.clone()).await;

        let response = make_request(
            Some(&state),
            app.clone(),
            Method::POST,
            "/api/v1/rent/user/booking/new",
            booking_body(property, "2024-06-05", "2024-06-10"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);

        // Same-day turnover is rejected under the inclusive rule.
        let response = make_request(
            Some(&state),
            app.clone(),
            Method::POST,
            "/api/v1/rent/user/booking/new",
            booking_body(property, "2024-06-01", "2024-06-05"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CONFLICT);

        // A disjoint stay goes through.
        let response = make_request(
            Some(&state),
            app,
            Method::POST,
            "/api/v1/rent/user/booking/new",
            booking_body(property, "2024-06-11", "2024-06-14"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[sqlx::test(fixtures("../../../fixtures/users.sql"))]
    async fn test_booking_rejects_zero_nights(pool: Pool<Postgres>) {
        let state = router::state(pool);
        let app = app(state.clone());
        let property = create_listing(&state, app.clone()).await;

        let response = make_request(
            Some(&state),
            app,
            Method::POST,
            "/api/v1/rent/user/booking/new",
            booking_body(property, "2024-06-05", "2024-06-05"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[sqlx::test(fixtures("../../../fixtures/users.sql"))]
    async fn test_booking_unknown_property(pool: Pool<Postgres>) {
        let state = router::state(pool);
        let app = app(state.clone());

        let response = make_request(
            Some(&state),
            app,
            Method::POST,
            "/api/v1/rent/user/booking/new",
            booking_body(uuid::Uuid::new_v4(), "2024-06-05", "2024-06-10"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
