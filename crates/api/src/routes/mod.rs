pub mod admin;
pub mod auth;
pub mod breeds;
pub mod health;
pub mod puppies;
pub mod reservations;
pub mod reviews;

use axum::routing::post;
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Build the `/api` route tree.
///
/// ```text
/// /auth/...                  register, login, refresh, logout, me
/// /puppies, /puppies/{id}    public catalog
/// /breeds, /breeds/{slug}    public breeds
/// /reviews                   approved reviews, submit a review
/// /contact                   contact form
/// /reservations              the caller's reservations (requires auth)
/// /admin/...                 back office (admin only)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/puppies", puppies::router())
        .nest("/breeds", breeds::router())
        .nest("/reviews", reviews::router())
        .route("/contact", post(handlers::contact::submit_contact))
        .nest("/reservations", reservations::router())
        .nest("/admin", admin::router())
        .nest("/admin/breeds", breeds::admin_router())
        .nest("/admin/reviews", reviews::admin_router())
}
