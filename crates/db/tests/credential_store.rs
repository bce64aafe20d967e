//! Integration tests for the `users` and `user_sessions` repositories.

use assert_matches::assert_matches;
use chrono::{Duration, Utc};
use classifieds_core::roles::Role;
use classifieds_db::models::session::NewSession;
use classifieds_db::models::user::{CreateUser, UpdateAccount, UpdateProfile};
use classifieds_db::repositories::user_repo::{UQ_EMAIL, UQ_USERNAME};
use classifieds_db::repositories::{SessionRepo, UserRepo};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn new_user(username: &str, email: &str) -> CreateUser {
    CreateUser {
        username: username.to_string(),
        email: email.to_string(),
        password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_string(),
        role: Role::User,
        email_verified: false,
    }
}

fn violated_constraint(err: &sqlx::Error) -> Option<String> {
    match err {
        sqlx::Error::Database(db) => db.constraint().map(str::to_string),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn create_defaults_to_unverified_user(pool: PgPool) {
    let user = UserRepo::create(&pool, &new_user("ana", "ana@x.hr"))
        .await
        .expect("create should succeed");

    assert!(user.id > 0);
    assert_eq!(user.role, Role::User);
    assert!(!user.email_verified);
    assert_eq!(user.first_name, "");
    assert_eq!(user.last_name, "");
    assert_eq!(user.phone, "");
    assert_eq!(user.profile_image_id, None);
}

#[sqlx::test(migrations = "./migrations")]
async fn duplicate_username_violates_username_constraint(pool: PgPool) {
    UserRepo::create(&pool, &new_user("ana", "ana@x.hr")).await.unwrap();

    let err = UserRepo::create(&pool, &new_user("ana", "other@x.hr"))
        .await
        .expect_err("duplicate username must fail");
    assert_eq!(violated_constraint(&err).as_deref(), Some(UQ_USERNAME));
}

#[sqlx::test(migrations = "./migrations")]
async fn duplicate_email_violates_email_constraint(pool: PgPool) {
    UserRepo::create(&pool, &new_user("ana", "ana@x.hr")).await.unwrap();

    let err = UserRepo::create(&pool, &new_user("bojan", "ana@x.hr"))
        .await
        .expect_err("duplicate email must fail");
    assert_eq!(violated_constraint(&err).as_deref(), Some(UQ_EMAIL));
}

#[sqlx::test(migrations = "./migrations")]
async fn lookups_by_username_email_and_id(pool: PgPool) {
    let created = UserRepo::create(&pool, &new_user("ana", "ana@x.hr")).await.unwrap();

    let by_name = UserRepo::find_by_username(&pool, "ana").await.unwrap();
    let by_email = UserRepo::find_by_email(&pool, "ana@x.hr").await.unwrap();
    let by_id = UserRepo::find_by_id(&pool, created.id).await.unwrap();

    assert_eq!(by_name.map(|u| u.id), Some(created.id));
    assert_eq!(by_email.map(|u| u.id), Some(created.id));
    assert_eq!(by_id.map(|u| u.username), Some("ana".to_string()));
    assert!(UserRepo::find_by_username(&pool, "nobody").await.unwrap().is_none());
    assert!(UserRepo::find_by_id(&pool, 9_999).await.unwrap().is_none());
}

#[sqlx::test(migrations = "./migrations")]
async fn set_verified_only_succeeds_once(pool: PgPool) {
    let user = UserRepo::create(&pool, &new_user("ana", "ana@x.hr")).await.unwrap();

    let first = UserRepo::set_verified(&pool, user.id).await.unwrap();
    assert_matches!(first, Some(u) if u.email_verified);

    let second = UserRepo::set_verified(&pool, user.id).await.unwrap();
    assert!(second.is_none(), "already verified row must not be updated");
}

#[sqlx::test(migrations = "./migrations")]
async fn update_profile_normalizes_missing_fields(pool: PgPool) {
    let user = UserRepo::create(&pool, &new_user("ana", "ana@x.hr")).await.unwrap();

    let with_image = UpdateProfile {
        first_name: Some("Ana".into()),
        last_name: Some("Anić".into()),
        phone: Some("091 111 222".into()),
        profile_image_id: Some(77),
    };
    let updated = UserRepo::update_profile(&pool, user.id, &with_image)
        .await
        .unwrap()
        .expect("user exists");
    assert_eq!(updated.first_name, "Ana");
    assert_eq!(updated.profile_image_id, Some(77));

    // Omitted fields become empty strings, the image is kept.
    let cleared = UserRepo::update_profile(&pool, user.id, &UpdateProfile::default())
        .await
        .unwrap()
        .expect("user exists");
    assert_eq!(cleared.first_name, "");
    assert_eq!(cleared.last_name, "");
    assert_eq!(cleared.phone, "");
    assert_eq!(cleared.profile_image_id, Some(77));
}

#[sqlx::test(migrations = "./migrations")]
async fn update_role_persists(pool: PgPool) {
    let user = UserRepo::create(&pool, &new_user("ana", "ana@x.hr")).await.unwrap();

    assert!(UserRepo::update_role(&pool, user.id, Role::Admin).await.unwrap());
    let reloaded = UserRepo::find_by_id(&pool, user.id).await.unwrap().unwrap();
    assert_eq!(reloaded.role, Role::Admin);
}

#[sqlx::test(migrations = "./migrations")]
async fn update_account_keeps_password_when_not_given(pool: PgPool) {
    let user = UserRepo::create(&pool, &new_user("ana", "ana@x.hr")).await.unwrap();

    let edit = UpdateAccount {
        username: "ana2".into(),
        email: "ana2@x.hr".into(),
        role: Role::Admin,
        email_verified: true,
        password_hash: None,
    };
    let updated = UserRepo::update_account(&pool, user.id, &edit)
        .await
        .unwrap()
        .expect("user exists");

    assert_eq!(updated.username, "ana2");
    assert_eq!(updated.role, Role::Admin);
    assert!(updated.email_verified);
    assert_eq!(updated.password_hash, user.password_hash);
}

#[sqlx::test(migrations = "./migrations")]
async fn find_conflicting_ignores_the_edited_user(pool: PgPool) {
    let ana = UserRepo::create(&pool, &new_user("ana", "ana@x.hr")).await.unwrap();
    let bojan = UserRepo::create(&pool, &new_user("bojan", "bojan@x.hr")).await.unwrap();

    let none = UserRepo::find_conflicting(&pool, ana.id, "ana", "ana@x.hr").await.unwrap();
    assert!(none.is_none());

    let clash = UserRepo::find_conflicting(&pool, ana.id, "bojan", "ana@x.hr").await.unwrap();
    assert_eq!(clash.map(|u| u.id), Some(bojan.id));
}

#[sqlx::test(migrations = "./migrations")]
async fn delete_removes_user_and_sessions(pool: PgPool) {
    let user = UserRepo::create(&pool, &new_user("ana", "ana@x.hr")).await.unwrap();
    SessionRepo::insert(
        &pool,
        &NewSession {
            user_id: user.id,
            token_hash: "hash-1".into(),
            expires_at: Utc::now() + Duration::hours(1),
            persistent: false,
            user_agent: None,
            ip_address: None,
        },
    )
    .await
    .unwrap();

    assert!(UserRepo::delete(&pool, user.id).await.unwrap());
    assert!(UserRepo::find_by_id(&pool, user.id).await.unwrap().is_none());
    assert!(SessionRepo::find_live(&pool, "hash-1")
        .await
        .unwrap()
        .is_none());
    assert!(!UserRepo::delete(&pool, user.id).await.unwrap());
}

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn expired_and_revoked_sessions_are_not_live(pool: PgPool) {
    let user = UserRepo::create(&pool, &new_user("ana", "ana@x.hr")).await.unwrap();

    for (hash, expires_at) in [
        ("live", Utc::now() + Duration::hours(1)),
        ("stale", Utc::now() - Duration::hours(1)),
    ] {
        SessionRepo::insert(
            &pool,
            &NewSession {
                user_id: user.id,
                token_hash: hash.into(),
                expires_at,
                persistent: true,
                user_agent: Some("test".into()),
                ip_address: None,
            },
        )
        .await
        .unwrap();
    }

    assert!(SessionRepo::find_live(&pool, "live").await.unwrap().is_some());
    assert!(SessionRepo::find_live(&pool, "stale").await.unwrap().is_none());

    assert_eq!(SessionRepo::revoke(&pool, "live").await.unwrap(), Some(user.id));
    assert_eq!(SessionRepo::revoke(&pool, "live").await.unwrap(), None);
    assert_eq!(SessionRepo::revoke(&pool, "stale").await.unwrap(), None);
    assert!(SessionRepo::find_live(&pool, "live").await.unwrap().is_none());

    assert_eq!(SessionRepo::purge_stale(&pool).await.unwrap(), 2);
}
