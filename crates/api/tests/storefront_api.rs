//! HTTP-level integration tests for breeds, reviews, the contact form and
//! image uploads.

mod common;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use common::{body_json, delete_auth, get, get_auth, post_json, post_json_auth, put_json_auth};
use sqlx::PgPool;
use tower::ServiceExt;

// ---------------------------------------------------------------------------
// Breeds
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn breed_crud_and_slug_lookup(pool: PgPool) {
    let admin = common::admin_token(&pool).await;

    let response = post_json_auth(
        common::build_test_app(pool.clone()),
        "/api/admin/breeds",
        serde_json::json!({ "name": "Golden Retriever", "size": "Large" }),
        &admin,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await["data"].clone();
    assert_eq!(created["slug"], "golden-retriever");
    let id = created["id"].as_str().unwrap().to_string();

    let response = get(common::build_test_app(pool.clone()), "/api/breeds/golden-retriever").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["size"], "Large");

    let response = put_json_auth(
        common::build_test_app(pool.clone()),
        "/api/admin/breeds",
        serde_json::json!({
            "id": id,
            "name": "Golden Retriever",
            "slug": "golden-retriever",
            "temperament": "Friendly",
        }),
        &admin,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["temperament"], "Friendly");

    let response = delete_auth(
        common::build_test_app(pool.clone()),
        &format!("/api/admin/breeds?id={id}"),
        &admin,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = get(common::build_test_app(pool), "/api/breeds/golden-retriever").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn breed_without_name_returns_400(pool: PgPool) {
    let admin = common::admin_token(&pool).await;
    let response = post_json_auth(
        common::build_test_app(pool),
        "/api/admin/breeds",
        serde_json::json!({ "name": "  " }),
        &admin,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Reviews
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn reviews_are_hidden_until_approved(pool: PgPool) {
    let admin = common::admin_token(&pool).await;

    let response = post_json(
        common::build_test_app(pool.clone()),
        "/api/reviews",
        serde_json::json!({ "author_name": "Happy Owner", "rating": 5, "text": "Lovely puppy!" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let review = body_json(response).await["data"].clone();
    assert_eq!(review["approved"], false);
    let id = review["id"].as_str().unwrap().to_string();

    let json = body_json(get(common::build_test_app(pool.clone()), "/api/reviews").await).await;
    assert!(json["data"].as_array().unwrap().is_empty());

    let json = body_json(get_auth(common::build_test_app(pool.clone()), "/api/admin/reviews", &admin).await).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);

    let response = put_json_auth(
        common::build_test_app(pool.clone()),
        &format!("/api/admin/reviews/{id}/approve"),
        serde_json::json!({}),
        &admin,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(get(common::build_test_app(pool.clone()), "/api/reviews").await).await;
    assert_eq!(json["data"][0]["text"], "Lovely puppy!");

    let response = delete_auth(
        common::build_test_app(pool),
        &format!("/api/admin/reviews/{id}"),
        &admin,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn review_with_bad_rating_returns_400(pool: PgPool) {
    let response = post_json(
        common::build_test_app(pool),
        "/api/reviews",
        serde_json::json!({ "author_name": "Grumpy", "rating": 9, "text": "Too many stars" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Contact form
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn contact_form_validates_then_succeeds(pool: PgPool) {
    let response = post_json(
        common::build_test_app(pool.clone()),
        "/api/contact",
        serde_json::json!({ "name": "Ada", "message": "Is Max available?" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Without a mail transport the request still succeeds.
    let response = post_json(
        common::build_test_app(pool),
        "/api/contact",
        serde_json::json!({
            "name": "Ada",
            "email": "ada@example.com",
            "subject": "Max",
            "message": "Is Max available?",
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["success"], true);
}

// ---------------------------------------------------------------------------
// Uploads
// ---------------------------------------------------------------------------

const BOUNDARY: &str = "goldipuppy-test-boundary";
const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR\0\0\0\x01\0\0\0\x01\x08\x06\0\0\0";

fn multipart_body(filename: &str, content: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

async fn upload(pool: &PgPool, token: &str, filename: &str, content: &[u8]) -> axum::response::Response {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/admin/uploads")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(filename, content)))
        .unwrap();
    common::build_test_app(pool.clone()).oneshot(request).await.unwrap()
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn upload_returns_a_public_url(pool: PgPool) {
    let admin = common::admin_token(&pool).await;

    let response = upload(&pool, &admin, "max.png", PNG_BYTES).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let url = body_json(response).await["data"]["url"].as_str().unwrap().to_string();
    assert!(url.starts_with("http://localhost:3000/storage/v1/object/public/puppy-images/puppies/"));
    assert!(url.ends_with(".png"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn upload_rejects_bad_extension_and_content(pool: PgPool) {
    let admin = common::admin_token(&pool).await;

    let response = upload(&pool, &admin, "notes.txt", b"hello").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = upload(&pool, &admin, "fake.png", b"<html></html>").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn upload_requires_admin(pool: PgPool) {
    let (_, customer) = common::customer_token(&pool, "buyer@example.com").await;
    let response = upload(&pool, &customer, "max.png", PNG_BYTES).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
