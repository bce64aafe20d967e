//! HTTP-level integration tests for admin user management.

mod common;

use axum::http::StatusCode;
use common::{body_json, create_user, delete, get, login, post_json, put_json};
use serde_json::json;
use sqlx::PgPool;

use classifieds_core::roles::Role;
use classifieds_db::models::ad::CreateAd;
use classifieds_db::repositories::{AdRepo, UserRepo};

#[sqlx::test(migrations = "../db/migrations")]
async fn admin_routes_reject_non_admins(pool: PgPool) {
    create_user(&pool, "ana", Role::User, true).await;
    let app = common::build_test_app(pool);

    assert_eq!(
        get(&app, "/api/v1/admin/users", None).await.status(),
        StatusCode::UNAUTHORIZED
    );

    let cookie = login(&app, "ana").await;
    let response = get(&app, "/api/v1/admin/users", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["code"], "FORBIDDEN");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn admin_lists_and_gets_users(pool: PgPool) {
    create_user(&pool, "admin", Role::Admin, true).await;
    let ana = create_user(&pool, "ana", Role::User, false).await;
    let app = common::build_test_app(pool);
    let cookie = login(&app, "admin").await;

    let json = body_json(get(&app, "/api/v1/admin/users", Some(&cookie)).await).await;
    let users = json["data"].as_array().unwrap();
    assert_eq!(users.len(), 2);
    assert!(users.iter().all(|u| u.get("password_hash").is_none()));

    let json = body_json(get(&app, &format!("/api/v1/admin/users/{}", ana.id), Some(&cookie)).await).await;
    assert_eq!(json["username"], "ana");

    let response = get(&app, "/api/v1/admin/users/999999", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn admin_creates_verified_user_that_can_log_in(pool: PgPool) {
    create_user(&pool, "admin", Role::Admin, true).await;
    let app = common::build_test_app(pool);
    let cookie = login(&app, "admin").await;

    let response = post_json(
        &app,
        "/api/v1/admin/users",
        Some(&cookie),
        json!({
            "username": "marko",
            "email": "marko@x.hr",
            "password": common::TEST_PASSWORD,
            "role": "admin",
            "email_verified": true,
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["role"], "admin");
    assert_eq!(json["email_verified"], true);

    // No verification round-trip needed.
    login(&app, "marko").await;
}

#[sqlx::test(migrations = "../db/migrations")]
async fn admin_create_rejects_unknown_role_and_duplicates(pool: PgPool) {
    create_user(&pool, "admin", Role::Admin, true).await;
    let app = common::build_test_app(pool.clone());
    let cookie = login(&app, "admin").await;

    let response = post_json(
        &app,
        "/api/v1/admin/users",
        Some(&cookie),
        json!({ "username": "marko", "email": "marko@x.hr", "password": "secret1", "role": "owner" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "INVALID_ROLE");
    assert!(UserRepo::find_by_username(&pool, "marko").await.unwrap().is_none());

    let response = post_json(
        &app,
        "/api/v1/admin/users",
        Some(&cookie),
        json!({ "username": "admin", "email": "new@x.hr", "password": "secret1" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["code"], "DUPLICATE_USERNAME");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn admin_edit_checks_other_users_only(pool: PgPool) {
    create_user(&pool, "admin", Role::Admin, true).await;
    let ana = create_user(&pool, "ana", Role::User, false).await;
    let app = common::build_test_app(pool.clone());
    let cookie = login(&app, "admin").await;
    let uri = format!("/api/v1/admin/users/{}", ana.id);

    // Keeping one's own username and email is not a conflict.
    let response = put_json(
        &app,
        &uri,
        Some(&cookie),
        json!({ "username": "ana", "email": "ana@x.hr", "role": "user", "email_verified": true }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["email_verified"], true);
    let unchanged = UserRepo::find_by_id(&pool, ana.id).await.unwrap().unwrap();
    assert_eq!(unchanged.password_hash, ana.password_hash, "no password given, hash kept");

    let response = put_json(
        &app,
        &uri,
        Some(&cookie),
        json!({ "username": "admin", "email": "ana@x.hr", "role": "user" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["code"], "DUPLICATE_USERNAME");

    let response = put_json(
        &app,
        &uri,
        Some(&cookie),
        json!({ "username": "ana", "email": "admin@x.hr", "role": "user" }),
    )
    .await;
    assert_eq!(body_json(response).await["code"], "DUPLICATE_EMAIL");

    let response = put_json(
        &app,
        &uri,
        Some(&cookie),
        json!({
            "username": "ana",
            "email": "ana@x.hr",
            "role": "user",
            "email_verified": true,
            "password": "brandnew",
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let response = post_json(
        &app,
        "/api/v1/auth/login",
        None,
        json!({ "username": "ana", "password": "brandnew" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn edit_of_unknown_user_is_404_whatever_the_body(pool: PgPool) {
    create_user(&pool, "admin", Role::Admin, true).await;
    let app = common::build_test_app(pool);
    let cookie = login(&app, "admin").await;

    for body in [
        json!({ "username": "ghost", "email": "ghost@x.hr", "role": "owner" }),
        json!({ "username": "g", "email": "not-an-email", "role": "user" }),
        json!({ "username": "ghost", "email": "ghost@x.hr", "role": "user" }),
    ] {
        let response = put_json(&app, "/api/v1/admin/users/999999", Some(&cookie), body).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["code"], "NOT_FOUND");
    }
}

#[sqlx::test(migrations = "../db/migrations")]
async fn role_change_takes_effect_on_next_request(pool: PgPool) {
    create_user(&pool, "admin", Role::Admin, true).await;
    let ana = create_user(&pool, "ana", Role::User, true).await;
    let app = common::build_test_app(pool);
    let admin = login(&app, "admin").await;
    let ana_cookie = login(&app, "ana").await;
    let uri = format!("/api/v1/admin/users/{}/role", ana.id);

    assert_eq!(
        get(&app, "/api/v1/admin/users", Some(&ana_cookie)).await.status(),
        StatusCode::FORBIDDEN
    );

    let response = put_json(&app, &uri, Some(&admin), json!({ "role": "superuser" })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "INVALID_ROLE");

    let response = put_json(&app, &uri, Some(&admin), json!({ "role": "admin" })).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["role"], "admin");

    // Same session, new role.
    assert_eq!(
        get(&app, "/api/v1/admin/users", Some(&ana_cookie)).await.status(),
        StatusCode::OK
    );
}

#[sqlx::test(migrations = "../db/migrations")]
async fn admin_cannot_delete_self(pool: PgPool) {
    let admin = create_user(&pool, "admin", Role::Admin, true).await;
    let app = common::build_test_app(pool.clone());
    let cookie = login(&app, "admin").await;

    let response = delete(&app, &format!("/api/v1/admin/users/{}", admin.id), Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(UserRepo::find_by_id(&pool, admin.id).await.unwrap().is_some());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn deleting_user_ends_sessions_and_orphans_ads(pool: PgPool) {
    create_user(&pool, "admin", Role::Admin, true).await;
    let ana = create_user(&pool, "ana", Role::User, true).await;
    let ad = AdRepo::create(
        &pool,
        &CreateAd {
            user_id: ana.id,
            title: "Oglas".into(),
            description: "desc".into(),
            seller: "ana".into(),
            cell_no: String::new(),
            price: 1.0,
            category: "razno".into(),
            location: String::new(),
            image_id: None,
        },
    )
    .await
    .unwrap();
    let app = common::build_test_app(pool.clone());
    let admin = login(&app, "admin").await;
    let ana_cookie = login(&app, "ana").await;

    let response = delete(&app, &format!("/api/v1/admin/users/{}", ana.id), Some(&admin)).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    assert_eq!(
        get(&app, "/api/v1/auth/profile", Some(&ana_cookie)).await.status(),
        StatusCode::UNAUTHORIZED
    );

    let orphan = AdRepo::find_by_id(&pool, ad.id).await.unwrap().unwrap();
    assert_eq!(orphan.user_id, None);

    let detail = body_json(get(&app, &format!("/api/v1/ads/{}", ad.id), Some(&admin)).await).await;
    assert_eq!(detail["can_edit"], true, "admins keep control of orphaned ads");
}
