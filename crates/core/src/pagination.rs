//! Page-number pagination for ad listings.
//!
//! Listings use 1-based page numbers with a fixed page size. [`PageInfo`]
//! is serialized alongside every listing so clients can render the pager.

use serde::Serialize;

/// Ads per page (a 3x4 grid).
pub const ADS_PER_PAGE: i64 = 12;

/// Pages shown on either side of the current page in [`page_range`].
const PAGE_WINDOW: i64 = 2;

/// Clamp a user-provided page number to `>= 1`.
pub fn clamp_page(page: Option<i64>) -> i64 {
    page.unwrap_or(1).max(1)
}

/// Row offset of the first item on `page`.
pub fn page_offset(page: i64, per_page: i64) -> i64 {
    (page.max(1) - 1).saturating_mul(per_page)
}

/// Number of pages needed for `total` items. An empty listing still has one
/// (empty) page.
pub fn total_pages(total: i64, per_page: i64) -> i64 {
    if total <= 0 || per_page <= 0 {
        return 1;
    }
    (total + per_page - 1) / per_page
}

/// Pagination metadata for one page of a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageInfo {
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
    pub total_pages: i64,
    pub has_prev: bool,
    pub has_next: bool,
    pub prev_page: Option<i64>,
    pub next_page: Option<i64>,
    /// Page numbers to render; `None` marks a gap ("...").
    pub pages: Vec<Option<i64>>,
}

impl PageInfo {
    pub fn new(page: i64, per_page: i64, total: i64) -> Self {
        let total_pages = total_pages(total, per_page);
        let has_prev = page > 1;
        let has_next = page < total_pages;
        Self {
            page,
            per_page,
            total,
            total_pages,
            has_prev,
            has_next,
            // Past the end, "previous" is the last real page.
            prev_page: has_prev.then(|| (page - 1).min(total_pages)),
            next_page: has_next.then(|| page + 1),
            pages: page_range(page, total_pages),
        }
    }
}

/// Compact list of page links: the first and last page, a window around
/// `page`, and `None` wherever more than one page is skipped. A gap of a
/// single page is shown as that page rather than as "...".
pub fn page_range(page: i64, total_pages: i64) -> Vec<Option<i64>> {
    if total_pages < 1 {
        return Vec::new();
    }
    let current = page.clamp(1, total_pages);
    let lo = (current - PAGE_WINDOW).max(1);
    let hi = (current + PAGE_WINDOW).min(total_pages);

    let mut anchors = vec![1];
    anchors.extend(lo..=hi);
    anchors.push(total_pages);
    anchors.sort_unstable();
    anchors.dedup();

    let mut out = Vec::with_capacity(anchors.len() + 2);
    let mut prev: Option<i64> = None;
    for p in anchors {
        if let Some(last) = prev {
            match p - last {
                1 => {}
                2 => out.push(Some(last + 1)),
                _ => out.push(None),
            }
        }
        out.push(Some(p));
        prev = Some(p);
    }
    out
}
