//! Handlers for `/admin/users`.
//!
//! Every handler takes [`RequireAdmin`]: the role is checked in isolation,
//! with no ownership component.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use classifieds_core::error::CoreError;
use classifieds_core::roles::Role;
use classifieds_core::types::{parse_db_id, DbId};
use classifieds_db::models::user::{User, UserResponse};
use classifieds_db::repositories::UserRepo;
use classifieds_events::{DomainEvent, EventKind, Subject};
use serde::{Deserialize, Serialize};
use serde_json::json;
use validator::Validate;

use crate::auth::accounts::{self, AccountEdit, NewAccount};
use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;
use crate::upload::discard_image;

/// Request body for `POST /admin/users`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 3, max = 20, message = "Username must be 3-20 characters"))]
    pub username: String,
    #[validate(
        email(message = "Invalid email address"),
        length(max = 120, message = "Email must be at most 120 characters")
    )]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    #[serde(default = "default_role")]
    pub role: String,
    #[serde(default)]
    pub email_verified: bool,
}

/// Request body for `PUT /admin/users/{id}`. An absent or empty `password`
/// keeps the current one.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 3, max = 20, message = "Username must be 3-20 characters"))]
    pub username: String,
    #[validate(
        email(message = "Invalid email address"),
        length(max = 120, message = "Email must be at most 120 characters")
    )]
    pub email: String,
    pub role: String,
    #[serde(default)]
    pub email_verified: bool,
    #[serde(default)]
    pub password: Option<String>,
}

/// Request body for `PUT /admin/users/{id}/role`.
#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub role: String,
}

/// Response of `PUT /admin/users/{id}/role`.
#[derive(Debug, Serialize)]
pub struct RoleResponse {
    pub id: DbId,
    pub role: Role,
}

fn default_role() -> String {
    Role::User.as_str().to_string()
}

/// GET /api/v1/admin/users
pub async fn list_users(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<UserResponse>>>> {
    let users = UserRepo::list(&state.pool).await?;
    Ok(Json(DataResponse {
        data: users.iter().map(UserResponse::from).collect(),
    }))
}

/// GET /api/v1/admin/users/{id}
pub async fn get_user(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> AppResult<Json<UserResponse>> {
    let user = load_user(&state, &raw_id).await?;
    Ok(Json(UserResponse::from(&user)))
}

/// POST /api/v1/admin/users
///
/// Creates an account with an explicit role; the verified flag is taken as
/// given and no verification email is sent.
pub async fn create_user(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<UserResponse>)> {
    input.validate()?;
    let role: Role = input.role.parse()?;

    let user = accounts::create_account(
        &state.pool,
        NewAccount {
            username: input.username,
            email: input.email,
            password: input.password,
            role,
            email_verified: input.email_verified,
        },
    )
    .await?;

    state.event_bus.publish(
        DomainEvent::new(EventKind::UserCreated, Subject::User(user.id))
            .by(admin.user_id)
            .detail(json!({ "role": user.role })),
    );

    Ok((StatusCode::CREATED, Json(UserResponse::from(&user))))
}

/// PUT /api/v1/admin/users/{id}
pub async fn update_user(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    Json(input): Json<UpdateUserRequest>,
) -> AppResult<Json<UserResponse>> {
    let target = load_user(&state, &raw_id).await?;

    input.validate()?;
    let role: Role = input.role.parse()?;
    let password = input.password.filter(|p| !p.is_empty());
    if let Some(p) = &password {
        if p.chars().count() < classifieds_core::fields::PASSWORD_MIN_LEN {
            return Err(AppError::Core(CoreError::Validation(
                "Password must be at least 6 characters".into(),
            )));
        }
    }

    let user = accounts::update_account(
        &state.pool,
        target.id,
        AccountEdit {
            username: input.username,
            email: input.email,
            role,
            email_verified: input.email_verified,
            password,
        },
    )
    .await?;

    state.event_bus.publish(
        DomainEvent::new(EventKind::UserUpdated, Subject::User(user.id))
            .by(admin.user_id),
    );
    tracing::info!(user_id = user.id, admin_id = admin.user_id, "User updated by admin");

    Ok(Json(UserResponse::from(&user)))
}

/// PUT /api/v1/admin/users/{id}/role
pub async fn update_role(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    Json(input): Json<UpdateRoleRequest>,
) -> AppResult<Json<RoleResponse>> {
    let target = load_user(&state, &raw_id).await?;
    let role = accounts::change_role(&state.pool, target.id, &input.role).await?;

    state.event_bus.publish(
        DomainEvent::new(EventKind::RoleChanged, Subject::User(target.id))
            .by(admin.user_id)
            .detail(json!({ "role": role })),
    );

    Ok(Json(RoleResponse {
        id: target.id,
        role,
    }))
}

/// DELETE /api/v1/admin/users/{id}
///
/// An admin may not delete their own account. The user's sessions go with
/// the row; their ads stay behind without an owner.
pub async fn delete_user(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> AppResult<StatusCode> {
    let target = load_user(&state, &raw_id).await?;
    if target.id == admin.user_id {
        return Err(AppError::Core(CoreError::Validation(
            "You cannot delete your own account".into(),
        )));
    }

    UserRepo::delete(&state.pool, target.id).await?;
    discard_image(&state.pool, target.profile_image_id).await;

    state.event_bus.publish(
        DomainEvent::new(EventKind::UserDeleted, Subject::User(target.id))
            .by(admin.user_id),
    );
    tracing::info!(user_id = target.id, admin_id = admin.user_id, "User deleted");

    Ok(StatusCode::NO_CONTENT)
}

async fn load_user(state: &AppState, raw_id: &str) -> AppResult<User> {
    let id =
        parse_db_id(raw_id).ok_or_else(|| AppError::NotFound(format!("User '{raw_id}' not found")))?;
    UserRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "User", id }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_request_defaults_to_user_role_unverified() {
        let req: CreateUserRequest = serde_json::from_value(json!({
            "username": "marko",
            "email": "marko@x.hr",
            "password": "secret1"
        }))
        .unwrap();
        assert_eq!(req.role, "user");
        assert!(!req.email_verified);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn create_request_rejects_bad_email() {
        let req: CreateUserRequest = serde_json::from_value(json!({
            "username": "marko",
            "email": "not-an-email",
            "password": "secret1"
        }))
        .unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn update_request_password_is_optional() {
        let req: UpdateUserRequest = serde_json::from_value(json!({
            "username": "marko",
            "email": "marko@x.hr",
            "role": "admin"
        }))
        .unwrap();
        assert!(req.password.is_none());
        assert!(req.validate().is_ok());
    }
}
