//! Property listings: the marketplace's inventory.

pub mod filter;
mod repository;

pub use repository::*;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::booking::BookingSummary;

/// Minimum number of images a listing must carry.
pub const MIN_IMAGES: u64 = 5;

pub const DEFAULT_CHECK_IN_TIME: &str = "11:00";
pub const DEFAULT_CHECK_OUT_TIME: &str = "13:00";

/// Kind of a [`Property`]. Closed set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropertyType {
    #[default]
    House,
    Flat,
    #[serde(rename = "Guest House")]
    GuestHouse,
    Hotel,
}

impl PropertyType {
    /// Case-insensitive match against the closed set.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        [Self::House, Self::Flat, Self::GuestHouse, Self::Hotel]
            .into_iter()
            .find(|kind| value.eq_ignore_ascii_case(kind.as_str()))
    }

    /// Canonical label, as persisted and served.
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyType::House => "House",
            PropertyType::Flat => "Flat",
            PropertyType::GuestHouse => "Guest House",
            PropertyType::Hotel => "Hotel",
        }
    }
}

impl std::fmt::Display for PropertyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for PropertyType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("unknown property type `{value}`"))
    }
}

/// Portion of a [`Property`] offered to guests. Closed set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomType {
    #[default]
    Anytype,
    Room,
    #[serde(rename = "Entire Home")]
    EntireHome,
}

impl RoomType {
    /// Case-insensitive match against the closed set.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        [Self::Anytype, Self::Room, Self::EntireHome]
            .into_iter()
            .find(|kind| value.eq_ignore_ascii_case(kind.as_str()))
    }

    /// Canonical label, as persisted and served.
    pub fn as_str(&self) -> &'static str {
        match self {
            RoomType::Anytype => "Anytype",
            RoomType::Room => "Room",
            RoomType::EntireHome => "Entire Home",
        }
    }
}

impl std::fmt::Display for RoomType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for RoomType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("unknown room type `{value}`"))
    }
}

/// Amenity names a listing may advertise. Closed set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AmenityName {
    Wifi,
    Kitchen,
    Ac,
    #[serde(rename = "Free Parking")]
    FreeParking,
    Tv,
    Pool,
    #[serde(rename = "Washing Machine")]
    WashingMachine,
}

impl AmenityName {
    /// Case-insensitive match against the closed set.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        [
            Self::Wifi,
            Self::Kitchen,
            Self::Ac,
            Self::FreeParking,
            Self::Tv,
            Self::Pool,
            Self::WashingMachine,
        ]
        .into_iter()
        .find(|name| value.eq_ignore_ascii_case(name.as_str()))
    }

    /// Canonical label, as persisted and served.
    pub fn as_str(&self) -> &'static str {
        match self {
            AmenityName::Wifi => "Wifi",
            AmenityName::Kitchen => "Kitchen",
            AmenityName::Ac => "Ac",
            AmenityName::FreeParking => "Free Parking",
            AmenityName::Tv => "Tv",
            AmenityName::Pool => "Pool",
            AmenityName::WashingMachine => "Washing Machine",
        }
    }
}

impl std::fmt::Display for AmenityName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An amenity tag: a name from the closed set plus its icon reference.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Amenity {
    pub name: AmenityName,
    pub icon: String,
}

/// External asset reference for a listing photo.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Image {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_id: Option<String>,
    pub url: String,
}

/// Where a [`Property`] is located.
///
/// `area`, `city` and `state` are normalized with [`normalize_place`]
/// before storage so that location search is a plain equality match.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Address {
    pub area: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub pincode: Option<String>,
}

impl Address {
    /// Normalize every searchable component.
    pub fn normalized(self) -> Self {
        Self {
            area: self.area.as_deref().map(normalize_place),
            city: self.city.as_deref().map(normalize_place),
            state: self.state.as_deref().map(normalize_place),
            pincode: self.pincode,
        }
    }
}

/// Lower-case a place name and strip all whitespace, so `"New  York"`
/// compares equal to a stored `"newyork"`.
pub fn normalize_place(value: &str) -> String {
    value
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase()
}

/// URL slug derived from the listing name.
pub fn slugify(name: &str) -> String {
    name.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

/// Property as saved on database.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub id: Uuid,
    #[serde(rename = "propertyName")]
    pub name: String,
    pub description: String,
    pub extra_info: Option<String>,
    #[sqlx(try_from = "String")]
    pub property_type: PropertyType,
    #[sqlx(try_from = "String")]
    pub room_type: RoomType,
    #[serde(rename = "maximumGuest")]
    pub max_guests: i32,
    #[sqlx(json)]
    pub amenities: Vec<Amenity>,
    #[sqlx(json)]
    pub images: Vec<Image>,
    pub price: i64,
    #[sqlx(flatten)]
    pub address: Address,
    #[sqlx(json)]
    pub current_bookings: Vec<BookingSummary>,
    #[serde(rename = "userId")]
    pub owner_id: Uuid,
    pub slug: String,
    pub check_in_time: String,
    pub check_out_time: String,
    pub created_at: DateTime<Utc>,
}
