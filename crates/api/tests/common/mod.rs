#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, Response};
use axum::Router;
use goldipuppy_api::auth::jwt::{generate_access_token, JwtConfig};
use goldipuppy_api::auth::password::hash_password;
use goldipuppy_api::config::{BankDetails, ServerConfig, StorageConfig, StoreConfig};
use goldipuppy_api::router::build_app_router;
use goldipuppy_api::state::AppState;
use goldipuppy_api::storage::LocalImageStore;
use goldipuppy_core::roles::{ROLE_ADMIN, ROLE_CUSTOMER};
use goldipuppy_core::types::DbId;
use goldipuppy_db::models::user::{CreateUser, User};
use goldipuppy_db::repositories::UserRepo;
use goldipuppy_events::EventBus;
use http_body_util::BodyExt;
use rust_decimal::Decimal;
use sqlx::PgPool;
use tower::ServiceExt;

/// Password given to every user created by [`create_user`].
pub const TEST_PASSWORD: &str = "puppy-lover-123";

/// Build a test `ServerConfig` with safe defaults.
///
/// Images go to a fresh directory under the system temp dir and the
/// background sweep is disabled.
pub fn test_config() -> ServerConfig {
    let root = std::env::temp_dir().join(format!("goldipuppy-test-{}", uuid::Uuid::new_v4()));
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        jwt: JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hs256".to_string(),
            access_token_expiry_mins: 15,
            refresh_token_expiry_days: 7,
        },
        store: StoreConfig {
            currency: "EUR".to_string(),
            deposit_amount: Decimal::from(300),
            grace_days: 2,
            bank: BankDetails {
                account_holder: "GoldiPuppy Kennels".to_string(),
                iban: "DE89370400440532013000".to_string(),
                bic: "COBADEFFXXX".to_string(),
                bank_name: "Test Bank".to_string(),
            },
            operator_email: "operator@goldipuppy.test".to_string(),
        },
        storage: StorageConfig {
            root,
            public_base_url: "http://localhost:3000/storage/v1/object/public".to_string(),
            bucket: "puppy-images".to_string(),
        },
        deposit_sweep_interval_secs: 0,
        outbox_poll_interval_secs: 10,
    }
}

/// Build the full application router with all middleware layers, using the
/// given database pool. No mail transport is configured.
pub fn build_test_app(pool: PgPool) -> Router {
    let config = test_config();
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        event_bus: Arc::new(EventBus::default()),
        contact_mailer: None,
        images: Arc::new(LocalImageStore::new(&config.storage)),
    };
    build_app_router(state, &config)
}

// ---------------------------------------------------------------------------
// Users and tokens
// ---------------------------------------------------------------------------

pub async fn create_user(pool: &PgPool, email: &str, role: &str) -> User {
    let input = CreateUser {
        email: email.to_string(),
        full_name: "Test User".to_string(),
        password_hash: hash_password(TEST_PASSWORD).expect("hashing should succeed"),
        role: role.to_string(),
    };
    UserRepo::create(pool, &input)
        .await
        .expect("user creation should succeed")
}

pub fn token_for(user_id: DbId, role: &str) -> String {
    generate_access_token(user_id, role, &test_config().jwt).expect("token should encode")
}

/// Create an admin and return a bearer token for them.
pub async fn admin_token(pool: &PgPool) -> String {
    let user = create_user(pool, "admin@goldipuppy.test", ROLE_ADMIN).await;
    token_for(user.id, ROLE_ADMIN)
}

/// Create a customer and return their id and a bearer token.
pub async fn customer_token(pool: &PgPool, email: &str) -> (DbId, String) {
    let user = create_user(pool, email, ROLE_CUSTOMER).await;
    (user.id, token_for(user.id, ROLE_CUSTOMER))
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

async fn send(
    app: Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None, None).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::GET, uri, Some(token), None).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, Method::POST, uri, None, Some(body)).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    send(app, Method::POST, uri, Some(token), Some(body)).await
}

pub async fn put_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    send(app, Method::PUT, uri, Some(token), Some(body)).await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::DELETE, uri, Some(token), None).await
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Create a listing through the admin API and return its JSON.
pub async fn create_puppy(pool: &PgPool, admin: &str, body: serde_json::Value) -> serde_json::Value {
    let response = post_json_auth(build_test_app(pool.clone()), "/api/admin/puppies", body, admin).await;
    assert_eq!(response.status(), axum::http::StatusCode::CREATED);
    body_json(response).await["data"].clone()
}

/// Minimal valid listing body.
pub fn puppy_body(name: &str) -> serde_json::Value {
    serde_json::json!({
        "name": name,
        "breed": "Golden Retriever",
        "breed_slug": "golden-retriever",
        "price": 1500,
        "gender": "Female",
        "age": "9 weeks",
    })
}

/// Reserve `puppy_id` as the holder of `token`.
pub async fn reserve(pool: &PgPool, puppy_id: &str, token: &str) -> Response<Body> {
    post_json_auth(
        build_test_app(pool.clone()),
        "/api/reservations",
        serde_json::json!({
            "puppy_id": puppy_id,
            "customer_name": "Jane Doe",
            "customer_email": "jane@example.com",
            "customer_phone": "+49 170 0000000",
        }),
        token,
    )
    .await
}
