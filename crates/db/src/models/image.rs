//! Stored image blobs.

use classifieds_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// An image row including its bytes.
#[derive(Debug, Clone, FromRow)]
pub struct StoredImage {
    pub id: DbId,
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
    pub created_at: Timestamp,
}

/// DTO for storing a new image.
#[derive(Debug)]
pub struct CreateImage {
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
}
