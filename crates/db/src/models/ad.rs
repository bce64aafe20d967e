//! Classified ad entity model and DTOs.

use classifieds_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `ads` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Ad {
    pub id: DbId,
    /// Owning user; `None` once the owner's account has been deleted.
    pub user_id: Option<DbId>,
    pub title: String,
    pub description: String,
    pub seller: String,
    pub cell_no: String,
    pub price: f64,
    pub category: String,
    pub location: String,
    pub image_id: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a new ad.
#[derive(Debug)]
pub struct CreateAd {
    pub user_id: DbId,
    pub title: String,
    pub description: String,
    pub seller: String,
    pub cell_no: String,
    pub price: f64,
    pub category: String,
    pub location: String,
    pub image_id: Option<DbId>,
}

/// DTO for a full ad edit. Ownership and `created_at` never change.
#[derive(Debug)]
pub struct UpdateAd {
    pub title: String,
    pub description: String,
    pub seller: String,
    pub cell_no: String,
    pub price: f64,
    pub category: String,
    pub location: String,
    pub image_id: Option<DbId>,
}

/// Listing filter. `None` fields do not constrain the query.
#[derive(Debug, Default, Clone)]
pub struct AdFilter {
    pub category: Option<String>,
    /// Case-insensitive substring of the title.
    pub search: Option<String>,
    pub owner_id: Option<DbId>,
}
