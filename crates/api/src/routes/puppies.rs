//! Route definitions for the public `/puppies` catalog.

use axum::routing::get;
use axum::Router;

use crate::handlers::puppies;
use crate::state::AppState;

/// Routes mounted at `/puppies`.
///
/// ```text
/// GET /       -> list_catalog (?breed=&status=&gender=&min_price=&max_price=&featured=&sort=)
/// GET /{id}   -> get_puppy
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(puppies::list_catalog))
        .route("/{id}", get(puppies::get_puppy))
}
