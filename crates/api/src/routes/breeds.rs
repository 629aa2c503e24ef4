//! Route definitions for `/breeds` and `/admin/breeds`.

use axum::routing::get;
use axum::Router;

use crate::handlers::breeds;
use crate::state::AppState;

/// Public routes mounted at `/breeds`.
///
/// ```text
/// GET /         -> list_breeds
/// GET /{slug}   -> get_breed
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(breeds::list_breeds))
        .route("/{slug}", get(breeds::get_breed))
}

/// Admin routes mounted at `/admin/breeds`.
///
/// ```text
/// POST   /        -> create_breed
/// PUT    /        -> update_breed (id in body)
/// DELETE /?id=    -> delete_breed
/// ```
pub fn admin_router() -> Router<AppState> {
    Router::new().route(
        "/",
        axum::routing::post(breeds::create_breed)
            .put(breeds::update_breed)
            .delete(breeds::delete_breed),
    )
}
