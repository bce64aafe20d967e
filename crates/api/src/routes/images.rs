use axum::routing::get;
use axum::Router;

use crate::handlers::images;
use crate::state::AppState;

/// Image downloads, mounted at the root so `<img src>` links stay short.
pub fn router() -> Router<AppState> {
    Router::new().route("/image/{id}", get(images::get_image))
}
