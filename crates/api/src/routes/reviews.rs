//! Route definitions for `/reviews` and `/admin/reviews`.

use axum::routing::{get, put};
use axum::Router;

use crate::handlers::reviews;
use crate::state::AppState;

/// Public routes mounted at `/reviews`.
///
/// ```text
/// GET  / -> list_approved
/// POST / -> create_review
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(reviews::list_approved).post(reviews::create_review))
}

/// Moderation routes mounted at `/admin/reviews`.
///
/// ```text
/// GET    /              -> list_all
/// PUT    /{id}/approve  -> approve_review
/// DELETE /{id}          -> delete_review
/// ```
pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", get(reviews::list_all))
        .route("/{id}/approve", put(reviews::approve_review))
        .route("/{id}", axum::routing::delete(reviews::delete_review))
}
