//! Image blob download.

use axum::extract::{Path, State};
use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use axum::response::IntoResponse;
use classifieds_core::types::parse_db_id;
use classifieds_db::repositories::ImageRepo;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// GET /image/{id}
///
/// Streams the stored bytes with their recorded content type. Unknown and
/// malformed ids are both 404.
pub async fn get_image(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let not_found = || AppError::NotFound(format!("Image '{raw_id}' not found"));

    let id = parse_db_id(&raw_id).ok_or_else(not_found)?;
    let image = ImageRepo::get(&state.pool, id).await?.ok_or_else(not_found)?;

    Ok((
        [
            (CONTENT_TYPE, image.content_type),
            (CACHE_CONTROL, "public, max-age=86400".to_string()),
        ],
        image.data,
    ))
}
