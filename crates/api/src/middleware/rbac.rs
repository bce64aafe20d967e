//! Role and ownership checks.
//!
//! [`RequireAdmin`] enforces the admin role at the type level for admin-only
//! routes. Resource mutations call [`ensure_can_act`] with the resource's
//! owner once it has been loaded.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use classifieds_core::error::CoreError;
use classifieds_core::permissions::{can_act, Identity};
use classifieds_core::types::DbId;

use super::auth::AuthUser;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Requires the `admin` role. Rejects with 401 when anonymous and 403 otherwise.
///
/// ```ignore
/// async fn admin_only(RequireAdmin(admin): RequireAdmin) -> AppResult<Json<()>> {
///     Ok(Json(()))
/// }
/// ```
pub struct RequireAdmin(pub AuthUser);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if user.identity().is_admin() {
            Ok(RequireAdmin(user))
        } else {
            Err(AppError::Core(CoreError::Forbidden("Admin role required".into())))
        }
    }
}

/// Fail with 403 unless `identity` may act on a resource owned by `owner_id`.
pub fn ensure_can_act(identity: &Identity, owner_id: Option<DbId>) -> AppResult<()> {
    if can_act(identity, owner_id) {
        Ok(())
    } else {
        Err(AppError::Core(CoreError::Forbidden(
            "You do not have permission to modify this resource".into(),
        )))
    }
}
