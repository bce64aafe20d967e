//! Repository for the `ads` table.

use classifieds_core::search::contains_pattern;
use classifieds_core::types::DbId;
use sqlx::PgPool;

use crate::models::ad::{Ad, AdFilter, CreateAd, UpdateAd};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, user_id, title, description, seller, cell_no, price, category, \
                        location, image_id, created_at, updated_at";

/// Shared WHERE clause for [`AdFilter`]; binds `$1` category, `$2` title
/// pattern, `$3` owner id.
const FILTER: &str = "($1::TEXT IS NULL OR category = $1)
               AND ($2::TEXT IS NULL OR title ILIKE $2 ESCAPE '\\')
               AND ($3::BIGINT IS NULL OR user_id = $3)";

/// Provides CRUD and listing operations for ads.
pub struct AdRepo;

impl AdRepo {
    /// Insert a new ad, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateAd) -> Result<Ad, sqlx::Error> {
        let query = format!(
            "INSERT INTO ads
                (user_id, title, description, seller, cell_no, price, category, location, image_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Ad>(&query)
            .bind(input.user_id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.seller)
            .bind(&input.cell_no)
            .bind(input.price)
            .bind(&input.category)
            .bind(&input.location)
            .bind(input.image_id)
            .fetch_one(pool)
            .await
    }

    /// Find an ad by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Ad>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM ads WHERE id = $1");
        sqlx::query_as::<_, Ad>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List one page of ads matching `filter`, newest first.
    pub async fn list(
        pool: &PgPool,
        filter: &AdFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Ad>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM ads
             WHERE {FILTER}
             ORDER BY created_at DESC, id DESC
             LIMIT $4 OFFSET $5"
        );
        sqlx::query_as::<_, Ad>(&query)
            .bind(&filter.category)
            .bind(filter.search.as_deref().map(contains_pattern))
            .bind(filter.owner_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Count all ads matching `filter`.
    pub async fn count(pool: &PgPool, filter: &AdFilter) -> Result<i64, sqlx::Error> {
        let query = format!("SELECT COUNT(*) FROM ads WHERE {FILTER}");
        sqlx::query_scalar::<_, i64>(&query)
            .bind(&filter.category)
            .bind(filter.search.as_deref().map(contains_pattern))
            .bind(filter.owner_id)
            .fetch_one(pool)
            .await
    }

    /// Replace the editable fields of an ad.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(pool: &PgPool, id: DbId, input: &UpdateAd) -> Result<Option<Ad>, sqlx::Error> {
        let query = format!(
            "UPDATE ads SET
                title = $2,
                description = $3,
                seller = $4,
                cell_no = $5,
                price = $6,
                category = $7,
                location = $8,
                image_id = $9
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Ad>(&query)
            .bind(id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.seller)
            .bind(&input.cell_no)
            .bind(input.price)
            .bind(&input.category)
            .bind(&input.location)
            .bind(input.image_id)
            .fetch_optional(pool)
            .await
    }

    /// Delete an ad. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM ads WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
