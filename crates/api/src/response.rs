//! Shared response envelope types for API handlers.
//!
//! Single resources are returned bare (`Json(T)`); listings use a
//! `{ "data": [...], "pagination": {...} }` envelope so clients can render
//! the pager without a second request.

use classifieds_core::pagination::PageInfo;
use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}

/// Paginated listing: `{ "data": [...], "pagination": {...} }`.
#[derive(Debug, Serialize)]
pub struct PagedResponse<T: Serialize> {
    pub data: Vec<T>,
    pub pagination: PageInfo,
}
