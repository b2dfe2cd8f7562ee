//! Listing query composition: filter, search and pagination.
//!
//! Raw string query parameters are parsed once into a typed
//! [`ListingFilter`]; rendering into SQL happens afterwards, with
//! pagination always applied last.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Deserialize;
use sqlx::{Postgres, QueryBuilder};

use crate::booking::DateRange;
use crate::property::{AmenityName, PropertyType, RoomType, normalize_place};

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_PAGE_SIZE: i64 = 12;

/// Marker on `maxPrice` meaning "this much and above".
const OPEN_ENDED_MARKER: char = '>';

/// Raw listing query parameters, all optional strings.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingParams {
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub property_type: Option<String>,
    pub room_type: Option<String>,
    pub amenities: Option<String>,
    pub city: Option<String>,
    pub guests: Option<String>,
    pub date_in: Option<String>,
    pub date_out: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

/// Price predicate of a [`ListingFilter`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PriceBound {
    /// `maxPrice` carried the open-ended marker: lower bound only.
    AtLeast(i64),
    /// Inclusive range.
    Between(i64, i64),
}

/// Typed, composable listing predicate.
///
/// For the closed-set fields, `Some` with nothing valid inside means the
/// parameter was supplied but matched none of the enum: such a filter
/// yields an empty result instead of being silently dropped.
#[derive(Clone, Debug, PartialEq)]
pub struct ListingFilter {
    pub price: Option<PriceBound>,
    pub property_types: Option<Vec<PropertyType>>,
    pub room_type: Option<Option<RoomType>>,
    pub amenities: Option<Vec<AmenityName>>,
    /// Normalized location term, matched against city OR state OR area.
    pub location: Option<String>,
    pub min_guests: Option<i32>,
    pub availability: Option<DateRange>,
    pub page: i64,
    pub limit: i64,
}

impl Default for ListingFilter {
    fn default() -> Self {
        Self {
            price: None,
            property_types: None,
            room_type: None,
            amenities: None,
            location: None,
            min_guests: None,
            availability: None,
            page: DEFAULT_PAGE,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ListingFilter {
    /// Build a filter from raw query parameters.
    ///
    /// Parsing is independent of parameter order; unknown closed-set
    /// values are dropped, and non-numeric page/limit fall back to the
    /// defaults.
    pub fn from_params(params: &ListingParams) -> Self {
        let price = match (&params.min_price, &params.max_price) {
            (Some(min), Some(max)) => {
                let open_ended = max.contains(OPEN_ENDED_MARKER);
                let min = min.trim().parse::<i64>().ok();
                if open_ended {
                    min.map(PriceBound::AtLeast)
                } else {
                    min.zip(max.trim().parse::<i64>().ok())
                        .map(|(min, max)| PriceBound::Between(min, max))
                }
            },
            _ => None,
        };

        let property_types = params.property_type.as_deref().map(|raw| {
            raw.split(',')
                .filter_map(PropertyType::parse)
                .collect::<Vec<_>>()
        });

        let room_type = params.room_type.as_deref().map(RoomType::parse);

        let amenities = params.amenities.as_deref().map(|raw| {
            raw.split(',')
                .filter_map(AmenityName::parse)
                .collect::<Vec<_>>()
        });

        let location = params
            .city
            .as_deref()
            .map(normalize_place)
            .filter(|term| !term.is_empty());

        let min_guests = params
            .guests
            .as_deref()
            .and_then(|raw| raw.trim().parse::<i32>().ok());

        let availability = match (&params.date_in, &params.date_out) {
            (Some(date_in), Some(date_out)) => parse_date(date_in)
                .zip(parse_date(date_out))
                .map(|(from, to)| DateRange::new(from, to)),
            _ => None,
        };

        let page = parse_positive(params.page.as_deref()).unwrap_or(DEFAULT_PAGE);
        let limit = parse_positive(params.limit.as_deref()).unwrap_or(DEFAULT_PAGE_SIZE);

        Self {
            price,
            property_types,
            room_type,
            amenities,
            location,
            min_guests,
            availability,
            page,
            limit,
        }
    }

    /// Rows skipped before the requested page.
    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }

    /// Append the filter and search predicates onto a query ending in a
    /// `WHERE` clause. Order of the individual predicates does not affect
    /// the result set.
    pub fn push_predicates(&self, query: &mut QueryBuilder<'_, Postgres>) {
        match self.price {
            Some(PriceBound::AtLeast(min)) => {
                query.push(" AND price >= ").push_bind(min);
            },
            Some(PriceBound::Between(min, max)) => {
                query.push(" AND price >= ").push_bind(min);
                query.push(" AND price <= ").push_bind(max);
            },
            None => {},
        }

        if let Some(types) = &self.property_types {
            if types.is_empty() {
                query.push(" AND FALSE");
            } else {
                let labels: Vec<String> =
                    types.iter().map(|t| t.as_str().to_owned()).collect();
                query.push(" AND property_type = ANY(").push_bind(labels).push(")");
            }
        }

        match self.room_type {
            Some(Some(room_type)) => {
                query
                    .push(" AND room_type = ")
                    .push_bind(room_type.as_str().to_owned());
            },
            Some(None) => {
                query.push(" AND FALSE");
            },
            None => {},
        }

        if let Some(amenities) = &self.amenities {
            if amenities.is_empty() {
                query.push(" AND FALSE");
            } else {
                // Every named amenity must be present among the tags.
                for name in amenities {
                    let tag = serde_json::json!([{ "name": name.as_str() }]);
                    query
                        .push(" AND amenities @> ")
                        .push_bind(sqlx::types::Json(tag));
                }
            }
        }

        if let Some(term) = &self.location {
            query
                .push(" AND (city = ")
                .push_bind(term.clone())
                .push(" OR state = ")
                .push_bind(term.clone())
                .push(" OR area = ")
                .push_bind(term.clone())
                .push(")");
        }

        if let Some(guests) = self.min_guests {
            query.push(" AND max_guests >= ").push_bind(guests);
        }

        if let Some(range) = self.availability {
            // Half-open test, unlike booking admission: a stay ending the
            // day a summary starts does not exclude the property here.
            query
                .push(" AND NOT EXISTS (")
                .push("SELECT 1 FROM jsonb_array_elements(current_bookings) AS booked")
                .push(" WHERE (booked->>'fromDate')::timestamptz < ")
                .push_bind(range.to)
                .push(" AND (booked->>'toDate')::timestamptz > ")
                .push_bind(range.from)
                .push(")");
        }
    }

    /// Append `LIMIT`/`OFFSET`. Must be the last stage of composition.
    pub fn push_pagination(&self, query: &mut QueryBuilder<'_, Postgres>) {
        query.push(" LIMIT ").push_bind(self.limit);
        query.push(" OFFSET ").push_bind(self.offset());
    }
}

fn parse_positive(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|v| v.trim().parse::<i64>().ok())
        .filter(|v| *v > 0)
}

/// Accept full RFC 3339 timestamps or bare `YYYY-MM-DD` dates.
fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    raw.parse::<NaiveDate>()
        .ok()
        .map(|date| date.and_time(NaiveTime::MIN).and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn params(pairs: &[(&str, &str)]) -> ListingParams {
        let mut p = ListingParams::default();
        for (key, value) in pairs {
            let value = Some((*value).to_owned());
            match *key {
                "minPrice" => p.min_price = value,
                "maxPrice" => p.max_price = value,
                "propertyType" => p.property_type = value,
                "roomType" => p.room_type = value,
                "amenities" => p.amenities = value,
                "city" => p.city = value,
                "guests" => p.guests = value,
                "dateIn" => p.date_in = value,
                "dateOut" => p.date_out = value,
                "page" => p.page = value,
                "limit" => p.limit = value,
                other => panic!("unknown param `{other}`"),
            }
        }
        p
    }

    fn sql_for(filter: &ListingFilter) -> String {
        let mut query = QueryBuilder::new("SELECT * FROM properties WHERE TRUE");
        filter.push_predicates(&mut query);
        filter.push_pagination(&mut query);
        query.sql().to_owned()
    }

    #[test]
    fn defaults_when_empty() {
        let filter = ListingFilter::from_params(&ListingParams::default());

        assert_eq!(filter, ListingFilter::default());
        assert_eq!(filter.page, 1);
        assert_eq!(filter.limit, 12);
        assert_eq!(filter.offset(), 0);
    }

    #[test]
    fn price_range_is_inclusive() {
        let filter = ListingFilter::from_params(&params(&[
            ("minPrice", "1000"),
            ("maxPrice", "5000"),
        ]));

        assert_eq!(filter.price, Some(PriceBound::Between(1000, 5000)));
    }

    #[test]
    fn open_ended_marker_keeps_lower_bound_only() {
        let filter = ListingFilter::from_params(&params(&[
            ("minPrice", "1000"),
            ("maxPrice", "5000>"),
        ]));

        assert_eq!(filter.price, Some(PriceBound::AtLeast(1000)));
    }

    #[test]
    fn price_needs_both_bounds() {
        let filter = ListingFilter::from_params(&params(&[("minPrice", "1000")]));
        assert_eq!(filter.price, None);
    }

    #[test]
    fn property_types_split_and_match_case_insensitively() {
        let filter = ListingFilter::from_params(&params(&[(
            "propertyType",
            "house, HOTEL,igloo",
        )]));

        assert_eq!(
            filter.property_types,
            Some(vec![PropertyType::House, PropertyType::Hotel]),
        );
    }

    #[test]
    fn supplied_but_invalid_enum_matches_nothing() {
        let filter = ListingFilter::from_params(&params(&[
            ("propertyType", "igloo"),
            ("roomType", "suite"),
        ]));

        assert_eq!(filter.property_types, Some(vec![]));
        assert_eq!(filter.room_type, Some(None));

        let sql = sql_for(&filter);
        assert_eq!(sql.matches("AND FALSE").count(), 2);
    }

    #[test]
    fn amenities_require_every_name() {
        let filter = ListingFilter::from_params(&params(&[(
            "amenities",
            "Wifi,washing machine",
        )]));

        assert_eq!(
            filter.amenities,
            Some(vec![AmenityName::Wifi, AmenityName::WashingMachine]),
        );

        // One containment predicate per required amenity.
        let sql = sql_for(&filter);
        assert_eq!(sql.matches("amenities @>").count(), 2);
    }

    #[test]
    fn location_term_is_normalized() {
        let filter = ListingFilter::from_params(&params(&[("city", "New  York")]));

        assert_eq!(filter.location.as_deref(), Some("newyork"));

        let sql = sql_for(&filter);
        assert!(sql.contains("city = "));
        assert!(sql.contains("OR state = "));
        assert!(sql.contains("OR area = "));
    }

    #[test]
    fn guests_is_inclusive_minimum_and_ignores_garbage() {
        let filter = ListingFilter::from_params(&params(&[("guests", "4")]));
        assert_eq!(filter.min_guests, Some(4));

        let filter = ListingFilter::from_params(&params(&[("guests", "a lot")]));
        assert_eq!(filter.min_guests, None);
    }

    #[test]
    fn availability_needs_both_dates() {
        let filter = ListingFilter::from_params(&params(&[("dateIn", "2024-06-01")]));
        assert_eq!(filter.availability, None);

        let filter = ListingFilter::from_params(&params(&[
            ("dateIn", "2024-06-01"),
            ("dateOut", "2024-06-05T00:00:00Z"),
        ]));
        let range = filter.availability.unwrap();
        assert_eq!(range.from, Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap());
        assert_eq!(range.to, Utc.with_ymd_and_hms(2024, 6, 5, 0, 0, 0).unwrap());
    }

    #[test]
    fn pagination_defaults_on_garbage_and_computes_offset() {
        let filter = ListingFilter::from_params(&params(&[
            ("page", "three"),
            ("limit", "-2"),
        ]));
        assert_eq!((filter.page, filter.limit), (1, 12));

        let filter = ListingFilter::from_params(&params(&[
            ("page", "3"),
            ("limit", "20"),
        ]));
        assert_eq!(filter.offset(), 40);
    }

    #[test]
    fn composition_is_independent_of_parameter_order() {
        let a = ListingFilter::from_params(&params(&[
            ("city", "Goa"),
            ("minPrice", "500"),
            ("maxPrice", "900"),
            ("guests", "2"),
        ]));
        let b = ListingFilter::from_params(&params(&[
            ("guests", "2"),
            ("maxPrice", "900"),
            ("city", "Goa"),
            ("minPrice", "500"),
        ]));

        assert_eq!(a, b);
        assert_eq!(sql_for(&a), sql_for(&b));
    }

    #[test]
    fn pagination_applies_last() {
        let filter = ListingFilter::from_params(&params(&[
            ("city", "Goa"),
            ("dateIn", "2024-06-01"),
            ("dateOut", "2024-06-05"),
        ]));
        let sql = sql_for(&filter);

        let limit = sql.rfind("LIMIT").unwrap();
        let offset = sql.rfind("OFFSET").unwrap();
        assert!(sql[..limit].contains("NOT EXISTS"));
        assert!(limit < offset);
        assert!(sql[offset..].starts_with("OFFSET"));
    }

    #[test]
    fn availability_test_is_half_open() {
        let filter = ListingFilter::from_params(&params(&[
            ("dateIn", "2024-06-01"),
            ("dateOut", "2024-06-05"),
        ]));
        let sql = sql_for(&filter);

        // Strict comparisons on both sides of the embedded summary range.
        assert!(sql.contains("(booked->>'fromDate')::timestamptz < "));
        assert!(sql.contains("(booked->>'toDate')::timestamptz > "));
    }
}
