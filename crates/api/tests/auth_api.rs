//! HTTP-level integration tests for registration, login, token refresh,
//! logout and account lockout.

mod common;

use axum::http::StatusCode;
use common::{body_json, get, get_auth, post_json, post_json_auth, TEST_PASSWORD};
use goldipuppy_core::roles::ROLE_CUSTOMER;
use sqlx::PgPool;

async fn login(pool: &PgPool, email: &str, password: &str) -> axum::response::Response {
    post_json(
        common::build_test_app(pool.clone()),
        "/api/auth/login",
        serde_json::json!({ "email": email, "password": password }),
    )
    .await
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn register_creates_a_customer_and_returns_tokens(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = post_json(
        app,
        "/api/auth/register",
        serde_json::json!({
            "email": "new@example.com",
            "full_name": "New Owner",
            "password": "long-enough-password",
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert!(json["access_token"].is_string());
    assert!(json["refresh_token"].is_string());
    assert_eq!(json["user"]["email"], "new@example.com");
    assert_eq!(json["user"]["role"], "customer");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn register_duplicate_email_returns_409(pool: PgPool) {
    common::create_user(&pool, "taken@example.com", ROLE_CUSTOMER).await;

    let app = common::build_test_app(pool);
    let response = post_json(
        app,
        "/api/auth/register",
        serde_json::json!({
            "email": "Taken@Example.com",
            "full_name": "Copycat",
            "password": "long-enough-password",
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn register_rejects_short_password(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = post_json(
        app,
        "/api/auth/register",
        serde_json::json!({
            "email": "short@example.com",
            "full_name": "Shorty",
            "password": "abc",
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn login_success_then_me(pool: PgPool) {
    let user = common::create_user(&pool, "owner@example.com", ROLE_CUSTOMER).await;

    let response = login(&pool, "owner@example.com", TEST_PASSWORD).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["user"]["id"], user.id.to_string());
    let token = json["access_token"].as_str().unwrap().to_string();

    let response = get_auth(common::build_test_app(pool), "/api/auth/me", &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["email"], "owner@example.com");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn me_without_token_returns_401(pool: PgPool) {
    let response = get(common::build_test_app(pool), "/api/auth/me").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn wrong_password_returns_401(pool: PgPool) {
    common::create_user(&pool, "owner@example.com", ROLE_CUSTOMER).await;

    let response = login(&pool, "owner@example.com", "not-the-password").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = login(&pool, "ghost@example.com", TEST_PASSWORD).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn five_failures_lock_the_account(pool: PgPool) {
    common::create_user(&pool, "locked@example.com", ROLE_CUSTOMER).await;

    for _ in 0..5 {
        let response = login(&pool, "locked@example.com", "wrong-password").await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    // Even the right password is refused while locked.
    let response = login(&pool, "locked@example.com", TEST_PASSWORD).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn refresh_rotates_the_token(pool: PgPool) {
    common::create_user(&pool, "owner@example.com", ROLE_CUSTOMER).await;
    let json = body_json(login(&pool, "owner@example.com", TEST_PASSWORD).await).await;
    let refresh_token = json["refresh_token"].as_str().unwrap().to_string();

    let response = post_json(
        common::build_test_app(pool.clone()),
        "/api/auth/refresh",
        serde_json::json!({ "refresh_token": refresh_token }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_ne!(json["refresh_token"].as_str().unwrap(), refresh_token);

    // The old token was revoked by the rotation.
    let response = post_json(
        common::build_test_app(pool),
        "/api/auth/refresh",
        serde_json::json!({ "refresh_token": refresh_token }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn logout_revokes_refresh_tokens(pool: PgPool) {
    common::create_user(&pool, "owner@example.com", ROLE_CUSTOMER).await;
    let json = body_json(login(&pool, "owner@example.com", TEST_PASSWORD).await).await;
    let access = json["access_token"].as_str().unwrap().to_string();
    let refresh_token = json["refresh_token"].as_str().unwrap().to_string();

    let response = post_json_auth(
        common::build_test_app(pool.clone()),
        "/api/auth/logout",
        serde_json::json!({}),
        &access,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = post_json(
        common::build_test_app(pool),
        "/api/auth/refresh",
        serde_json::json!({ "refresh_token": refresh_token }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
