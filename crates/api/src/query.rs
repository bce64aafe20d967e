//! Shared query parameter types for API handlers.

use classifieds_core::search::normalize_filter;
use serde::Deserialize;

/// Listing parameters for ads (`?page=&category=&search=`).
///
/// Blank `category` / `search` values mean "no filter"; `page` is clamped to
/// `>= 1` by the handler.
#[derive(Debug, Default, Deserialize)]
pub struct AdListParams {
    pub page: Option<i64>,
    pub category: Option<String>,
    pub search: Option<String>,
}

impl AdListParams {
    pub fn category(&self) -> Option<String> {
        normalize_filter(self.category.as_deref())
    }

    pub fn search(&self) -> Option<String> {
        normalize_filter(self.search.as_deref())
    }
}
