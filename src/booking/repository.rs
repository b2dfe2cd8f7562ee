//! Handle database requests for bookings.

use chrono::Utc;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::booking::{Booking, BookingStatus, BookingSummary, DateRange, is_admissible};
use crate::error::{Result, ServerError};

const COLUMNS: &str = "id, property_id, user_id, guests, price, from_date, to_date, \
                       nights, status, created_at";

/// The property's reservation list, read under a row lock.
#[derive(sqlx::FromRow)]
struct PropertyReservations {
    #[sqlx(json)]
    current_bookings: Vec<BookingSummary>,
}

#[derive(Clone)]
pub struct BookingRepository {
    pool: Pool<Postgres>,
}

impl BookingRepository {
    /// Create a new [`BookingRepository`].
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Admit and record a booking.
    ///
    /// One transaction holds a row lock on the property while the proposal
    /// is checked against its embedded reservation list, the booking row
    /// is inserted and the summary appended. Concurrent proposals for the
    /// same property serialize on the lock: the loser sees the winner's
    /// summary and fails with the conflict error, and a failure anywhere
    /// rolls back both writes.
    pub async fn create(
        &self,
        property_id: Uuid,
        user_id: Uuid,
        guests: i32,
        price: i64,
        range: DateRange,
    ) -> Result<Booking> {
        let mut tx = self.pool.begin().await?;

        let reservations = sqlx::query_as::<_, PropertyReservations>(
            "SELECT current_bookings FROM properties WHERE id = $1 FOR UPDATE",
        )
        .bind(property_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(ServerError::NotFound { entity: "property" })?;

        if !is_admissible(&range, &reservations.current_bookings) {
            return Err(ServerError::Conflict(
                "The property is already booked for the requested dates.",
            ));
        }

        let booking = Booking {
            id: Uuid::new_v4(),
            property_id,
            user_id,
            guests,
            price,
            from_date: range.from,
            to_date: range.to,
            nights: range.nights(),
            status: BookingStatus::Confirmed,
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"INSERT INTO bookings
                (id, property_id, user_id, guests, price, from_date, to_date,
                 nights, status, created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)"#,
        )
        .bind(booking.id)
        .bind(booking.property_id)
        .bind(booking.user_id)
        .bind(booking.guests)
        .bind(booking.price)
        .bind(booking.from_date)
        .bind(booking.to_date)
        .bind(booking.nights)
        .bind(booking.status.to_string())
        .bind(booking.created_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE properties SET current_bookings = current_bookings || $1 WHERE id = $2",
        )
        .bind(sqlx::types::Json(booking.summary()))
        .bind(property_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(booking)
    }

    /// All bookings owned by `user_id`, newest first.
    pub async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<Booking>> {
        let query = format!(
            "SELECT {COLUMNS} FROM bookings WHERE user_id = $1 ORDER BY created_at DESC",
        );

        Ok(sqlx::query_as::<_, Booking>(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?)
    }

    /// One booking, scoped to its owner.
    pub async fn find_for_user(&self, booking_id: Uuid, user_id: Uuid) -> Result<Booking> {
        let query = format!(
            "SELECT {COLUMNS} FROM bookings WHERE id = $1 AND user_id = $2",
        );

        sqlx::query_as::<_, Booking>(&query)
            .bind(booking_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(ServerError::NotFound { entity: "booking" })
    }
}
