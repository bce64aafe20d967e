//! Route definitions for the `/ads` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::ads;
use crate::state::AppState;

/// Routes mounted at `/api/v1/ads`.
///
/// ```text
/// GET    /       -> list_ads
/// POST   /       -> create_ad (requires auth, multipart)
/// GET    /mine   -> my_ads (requires auth)
/// GET    /{id}   -> get_ad
/// PUT    /{id}   -> update_ad (owner or admin, multipart)
/// DELETE /{id}   -> delete_ad (owner or admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(ads::list_ads).post(ads::create_ad))
        .route("/mine", get(ads::my_ads))
        .route(
            "/{id}",
            get(ads::get_ad).put(ads::update_ad).delete(ads::delete_ad),
        )
}
