//! Route definitions for the `/admin` back office.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use goldipuppy_core::storage::MAX_UPLOAD_BYTES;

use crate::handlers::{lifecycle, puppies, uploads};
use crate::state::AppState;

/// Headroom for multipart framing around the image itself.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Routes mounted at `/admin`.
///
/// All routes require the `admin` role (enforced by handler extractors).
///
/// ```text
/// GET    /puppies                          -> list_puppies
/// POST   /puppies                          -> create_puppy
/// PUT    /puppies                          -> update_puppy (id in body)
/// DELETE /puppies?id=                      -> delete_puppy
/// POST   /puppies/{id}/deposit/confirm     -> confirm_deposit
/// POST   /puppies/{id}/deposit/release     -> release_deposit
/// POST   /puppies/{id}/sold                -> mark_sold
/// GET    /puppies/{id}/reservations        -> list_puppy_reservations
/// GET    /puppies/{id}/events              -> list_puppy_events
/// GET    /reservations?status=             -> list_reservations
/// POST   /uploads                          -> upload_image
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/puppies",
            get(puppies::list_puppies)
                .post(puppies::create_puppy)
                .put(puppies::update_puppy)
                .delete(puppies::delete_puppy),
        )
        .route(
            "/puppies/{id}/deposit/confirm",
            post(lifecycle::confirm_deposit),
        )
        .route(
            "/puppies/{id}/deposit/release",
            post(lifecycle::release_deposit),
        )
        .route("/puppies/{id}/sold", post(lifecycle::mark_sold))
        .route(
            "/puppies/{id}/reservations",
            get(lifecycle::list_puppy_reservations),
        )
        .route("/puppies/{id}/events", get(puppies::list_puppy_events))
        .route("/reservations", get(lifecycle::list_reservations))
        .route(
            "/uploads",
            post(uploads::upload_image)
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES + MULTIPART_OVERHEAD_BYTES)),
        )
}
