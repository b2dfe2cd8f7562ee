//! Bookings and the date-range admission rule.

mod repository;

pub use repository::*;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A stay, bounded by two timestamps.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl DateRange {
    /// Create a new [`DateRange`].
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self { from, to }
    }

    /// Whether two ranges share at least one day.
    ///
    /// Inclusive on both ends: a booking ending on day X and one starting
    /// on day X are treated as overlapping, so same-day turnover is
    /// rejected.
    pub fn overlaps(&self, other: &DateRange) -> bool {
        self.from <= other.to && other.from <= self.to
    }

    /// Number of whole nights between the two bounds.
    pub fn nights(&self) -> i64 {
        (self.to - self.from).num_days()
    }
}

/// Denormalized copy of a booking kept on the property row for fast
/// availability filtering.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingSummary {
    pub booking_id: Uuid,
    pub from_date: DateTime<Utc>,
    pub to_date: DateTime<Utc>,
    pub user_id: Uuid,
}

impl BookingSummary {
    /// The summarized stay as a [`DateRange`].
    pub fn range(&self) -> DateRange {
        DateRange::new(self.from_date, self.to_date)
    }
}

/// Whether a proposed stay can be admitted against the property's current
/// reservations. No existing summary may intersect the proposal.
pub fn is_admissible(proposal: &DateRange, existing: &[BookingSummary]) -> bool {
    !existing.iter().any(|booked| booked.range().overlaps(proposal))
}

/// Lifecycle of a [`Booking`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    #[default]
    Confirmed,
    /// Reserved for a future cancellation flow; nothing constructs it.
    Cancelled,
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BookingStatus::Confirmed => write!(f, "confirmed"),
            BookingStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl TryFrom<String> for BookingStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "confirmed" => Ok(BookingStatus::Confirmed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            other => Err(format!("unknown booking status `{other}`")),
        }
    }
}

/// Booking as saved on database. Immutable once created.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: Uuid,
    #[serde(rename = "property")]
    pub property_id: Uuid,
    #[serde(rename = "user")]
    pub user_id: Uuid,
    pub guests: i32,
    pub price: i64,
    pub from_date: DateTime<Utc>,
    pub to_date: DateTime<Utc>,
    #[serde(rename = "numberOfNights")]
    pub nights: i64,
    #[sqlx(try_from = "String")]
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    /// The booked stay as a [`DateRange`].
    pub fn range(&self) -> DateRange {
        DateRange::new(self.from_date, self.to_date)
    }

    /// Summary to be appended on the property's embedded reservation list.
    pub fn summary(&self) -> BookingSummary {
        BookingSummary {
            booking_id: self.id,
            from_date: self.from_date,
            to_date: self.to_date,
            user_id: self.user_id,
        }
    }
}
