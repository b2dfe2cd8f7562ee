//! Handle database requests for listings.

use sqlx::{Pool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::error::{Result, ServerError};
use crate::property::{Property, filter::ListingFilter};

const COLUMNS: &str = "id, name, description, extra_info, property_type, room_type, \
                       max_guests, amenities, images, price, area, city, state, pincode, \
                       current_bookings, owner_id, slug, check_in_time, check_out_time, \
                       created_at";

#[derive(Clone)]
pub struct PropertyRepository {
    pool: Pool<Postgres>,
}

impl PropertyRepository {
    /// Create a new [`PropertyRepository`].
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Insert [`Property`] into database.
    pub async fn insert(&self, property: &Property) -> Result<()> {
        sqlx::query(
            r#"INSERT INTO properties
                (id, name, description, extra_info, property_type, room_type,
                 max_guests, amenities, images, price, area, city, state, pincode,
                 current_bookings, owner_id, slug, check_in_time, check_out_time,
                 created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                        $11, $12, $13, $14, $15, $16, $17, $18, $19, $20)"#,
        )
        .bind(property.id)
        .bind(&property.name)
        .bind(&property.description)
        .bind(&property.extra_info)
        .bind(property.property_type.as_str())
        .bind(property.room_type.as_str())
        .bind(property.max_guests)
        .bind(sqlx::types::Json(&property.amenities))
        .bind(sqlx::types::Json(&property.images))
        .bind(property.price)
        .bind(&property.address.area)
        .bind(&property.address.city)
        .bind(&property.address.state)
        .bind(&property.address.pincode)
        .bind(sqlx::types::Json(&property.current_bookings))
        .bind(property.owner_id)
        .bind(&property.slug)
        .bind(&property.check_in_time)
        .bind(&property.check_out_time)
        .bind(property.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Find a listing by `id`.
    pub async fn find_by_id(&self, property_id: Uuid) -> Result<Property> {
        let query = format!("SELECT {COLUMNS} FROM properties WHERE id = $1");

        sqlx::query_as::<_, Property>(&query)
            .bind(property_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(ServerError::NotFound { entity: "property" })
    }

    /// All listings owned by `owner_id`.
    pub async fn find_by_owner(&self, owner_id: Uuid) -> Result<Vec<Property>> {
        let query = format!(
            "SELECT {COLUMNS} FROM properties WHERE owner_id = $1 ORDER BY created_at DESC",
        );

        Ok(sqlx::query_as::<_, Property>(&query)
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await?)
    }

    /// Filtered, searched and paginated listings, together with the size
    /// of the whole collection.
    ///
    /// Predicates compose in one `WHERE` clause; a stable sort precedes
    /// `LIMIT`/`OFFSET` so pages are deterministic.
    pub async fn list(&self, filter: &ListingFilter) -> Result<(Vec<Property>, i64)> {
        let mut query =
            QueryBuilder::new(format!("SELECT {COLUMNS} FROM properties WHERE TRUE"));
        filter.push_predicates(&mut query);
        query.push(" ORDER BY created_at DESC, id");
        filter.push_pagination(&mut query);

        let properties = query
            .build_query_as::<Property>()
            .fetch_all(&self.pool)
            .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM properties")
            .fetch_one(&self.pool)
            .await?;

        Ok((properties, total))
    }
}
