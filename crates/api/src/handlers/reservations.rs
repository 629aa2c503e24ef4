//! Handlers for the caller's own reservations.
//!
//! Creating a reservation is the `Available -> AwaitingDeposit` transition;
//! cancelling one releases the hold while the deposit is not yet overdue.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use goldipuppy_core::lifecycle::{ReleaseReason, ReservationStatus};
use goldipuppy_core::types::DbId;
use goldipuppy_db::models::reservation::{ReservationView, ReserveRequest, UpdateReservationRequest};
use goldipuppy_db::repositories::{LifecycleRepo, ReservationRepo};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAuth;
use crate::notifications::{release_messages, reservation_messages};
use crate::query::IdParam;
use crate::response::DataResponse;
use crate::state::AppState;
use crate::transitions::{publish_transition, TransitionResponse};

/// GET /api/reservations
///
/// The caller's reservations, newest first, each with its deposit countdown.
pub async fn list_mine(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<ReservationView>>>> {
    let now = Utc::now();
    let rows = ReservationRepo::list_for_user(&state.pool, user.user_id).await?;
    Ok(Json(DataResponse {
        data: rows
            .into_iter()
            .map(|r| ReservationView::new(r, now))
            .collect(),
    }))
}

/// POST /api/reservations
///
/// Reserve an available puppy. Of two concurrent attempts on the same
/// listing exactly one succeeds; the other gets a 409.
pub async fn create_reservation(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Json(input): Json<ReserveRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<TransitionResponse>>)> {
    input.contact.check()?;

    let now = Utc::now();
    let store = &state.config.store;
    let outcome = LifecycleRepo::reserve(
        &state.pool,
        input.puppy_id,
        user.user_id,
        &input.contact,
        store.grace_days,
        now,
        |puppy, reservation| reservation_messages(store, puppy, reservation),
    )
    .await?;

    tracing::info!(
        puppy_id = %input.puppy_id,
        user_id = %user.user_id,
        deposit_reference = ?outcome.puppy.deposit_reference,
        "Puppy reserved"
    );
    publish_transition(&state.event_bus, &outcome, Some(user.user_id));
    let data = TransitionResponse::load(&state.pool, outcome, now).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data })))
}

/// PUT /api/reservations
///
/// The only change a customer may make is `{"status": "cancelled"}`.
pub async fn update_reservation(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Json(input): Json<UpdateReservationRequest>,
) -> AppResult<Json<DataResponse<TransitionResponse>>> {
    if input.status != ReservationStatus::Cancelled {
        return Err(AppError::BadRequest(
            "Reservations can only be updated to 'cancelled'".into(),
        ));
    }
    cancel(&state, user, input.id).await.map(Json)
}

/// DELETE /api/reservations?id=
pub async fn cancel_reservation(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Query(params): Query<IdParam>,
) -> AppResult<Json<DataResponse<TransitionResponse>>> {
    cancel(&state, user, params.id).await.map(Json)
}

async fn cancel(
    state: &AppState,
    user: AuthUser,
    reservation_id: DbId,
) -> AppResult<DataResponse<TransitionResponse>> {
    let now = Utc::now();
    let store = &state.config.store;
    let outcome = LifecycleRepo::cancel_by_customer(
        &state.pool,
        reservation_id,
        user.user_id,
        now,
        |puppy, reservation| {
            release_messages(store, ReleaseReason::CustomerCancelled, puppy, reservation)
        },
    )
    .await?;

    tracing::info!(
        reservation_id = %reservation_id,
        user_id = %user.user_id,
        puppy_released = outcome.puppy_changed,
        "Reservation cancelled by customer"
    );
    publish_transition(&state.event_bus, &outcome, Some(user.user_id));
    let data = TransitionResponse::load(&state.pool, outcome, now).await?;
    Ok(DataResponse { data })
}
