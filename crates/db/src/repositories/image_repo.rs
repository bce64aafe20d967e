//! Repository for the `images` table, the blob store behind ad and
//! profile pictures.

use classifieds_core::types::DbId;
use sqlx::PgPool;

use crate::models::image::{CreateImage, StoredImage};

/// Provides put/get/delete for image blobs.
pub struct ImageRepo;

impl ImageRepo {
    /// Store an image, returning its new id.
    pub async fn put(pool: &PgPool, input: &CreateImage) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar::<_, DbId>(
            "INSERT INTO images (filename, content_type, data)
             VALUES ($1, $2, $3)
             RETURNING id",
        )
        .bind(&input.filename)
        .bind(&input.content_type)
        .bind(&input.data)
        .fetch_one(pool)
        .await
    }

    /// Fetch an image with its bytes.
    pub async fn get(pool: &PgPool, id: DbId) -> Result<Option<StoredImage>, sqlx::Error> {
        sqlx::query_as::<_, StoredImage>(
            "SELECT id, filename, content_type, data, created_at FROM images WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Delete an image. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM images WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
