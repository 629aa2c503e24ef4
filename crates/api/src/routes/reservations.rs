//! Route definitions for the caller's `/reservations`.

use axum::routing::get;
use axum::Router;

use crate::handlers::reservations;
use crate::state::AppState;

/// Routes mounted at `/reservations`. All require authentication.
///
/// ```text
/// GET    /       -> list_mine
/// POST   /       -> create_reservation
/// PUT    /       -> update_reservation ({id, status: "cancelled"})
/// DELETE /?id=   -> cancel_reservation
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/",
        get(reservations::list_mine)
            .post(reservations::create_reservation)
            .put(reservations::update_reservation)
            .delete(reservations::cancel_reservation),
    )
}
