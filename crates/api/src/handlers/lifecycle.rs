//! Operator lifecycle actions on a listing: confirm deposit, release the
//! hold, mark sold. Plus the admin view of all reservations.

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use goldipuppy_core::error::CoreError;
use goldipuppy_core::lifecycle::ReleaseReason;
use goldipuppy_core::types::DbId;
use goldipuppy_db::models::reservation::{Reservation, ReservationListParams, ReservationView};
use goldipuppy_db::repositories::{Actor, LifecycleRepo, PuppyRepo, ReservationRepo};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::notifications::{deposit_received_messages, release_messages};
use crate::response::DataResponse;
use crate::state::AppState;
use crate::transitions::{publish_transition, TransitionResponse};

/// Request body for `POST /admin/puppies/{id}/deposit/release`.
#[derive(Debug, Deserialize)]
pub struct ReleaseRequest {
    /// `expired` or `cancelled`.
    pub reason: ReleaseReason,
}

/// POST /api/admin/puppies/{id}/deposit/confirm
///
/// `AwaitingDeposit -> Confirmed`. The response carries the settled
/// reservation, or `null` when the listing had none pending.
pub async fn confirm_deposit(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<TransitionResponse>>> {
    let now = Utc::now();
    let actor = Actor {
        user_id: Some(admin.user_id),
        now,
    };
    let store = &state.config.store;
    let outcome = LifecycleRepo::confirm_deposit(&state.pool, id, actor, |puppy, reservation| {
        deposit_received_messages(store, puppy, reservation)
    })
    .await?;

    tracing::info!(puppy_id = %id, admin_id = %admin.user_id, "Deposit confirmed");
    publish_transition(&state.event_bus, &outcome, actor.user_id);
    let data = TransitionResponse::load(&state.pool, outcome, now).await?;
    Ok(Json(DataResponse { data }))
}

/// POST /api/admin/puppies/{id}/deposit/release
///
/// `AwaitingDeposit -> Available`, recording whether the deposit expired
/// or the hold was cancelled.
pub async fn release_deposit(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<ReleaseRequest>,
) -> AppResult<Json<DataResponse<TransitionResponse>>> {
    if input.reason == ReleaseReason::CustomerCancelled {
        return Err(AppError::BadRequest(
            "reason must be 'expired' or 'cancelled'".into(),
        ));
    }

    let now = Utc::now();
    let actor = Actor {
        user_id: Some(admin.user_id),
        now,
    };
    let store = &state.config.store;
    let outcome = LifecycleRepo::release(&state.pool, id, input.reason, actor, |puppy, reservation| {
        release_messages(store, input.reason, puppy, reservation)
    })
    .await?;

    tracing::info!(
        puppy_id = %id,
        admin_id = %admin.user_id,
        reason = input.reason.as_str(),
        "Deposit hold released"
    );
    publish_transition(&state.event_bus, &outcome, actor.user_id);
    let data = TransitionResponse::load(&state.pool, outcome, now).await?;
    Ok(Json(DataResponse { data }))
}

/// POST /api/admin/puppies/{id}/sold
///
/// `Available | Confirmed -> Sold`.
pub async fn mark_sold(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<TransitionResponse>>> {
    let now = Utc::now();
    let actor = Actor {
        user_id: Some(admin.user_id),
        now,
    };
    let outcome = LifecycleRepo::mark_sold(&state.pool, id, actor).await?;

    tracing::info!(puppy_id = %id, admin_id = %admin.user_id, "Puppy marked sold");
    publish_transition(&state.event_bus, &outcome, actor.user_id);
    let data = TransitionResponse::load(&state.pool, outcome, now).await?;
    Ok(Json(DataResponse { data }))
}

/// GET /api/admin/reservations?status=
pub async fn list_reservations(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(params): Query<ReservationListParams>,
) -> AppResult<Json<DataResponse<Vec<ReservationView>>>> {
    let now = Utc::now();
    let rows = ReservationRepo::list_all(&state.pool, params.status).await?;
    Ok(Json(DataResponse {
        data: rows
            .into_iter()
            .map(|r| ReservationView::new(r, now))
            .collect(),
    }))
}

/// GET /api/admin/puppies/{id}/reservations
///
/// Reservation history of one listing, newest first.
pub async fn list_puppy_reservations(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<Reservation>>>> {
    if PuppyRepo::find_row(&state.pool, id).await?.is_none() {
        return Err(AppError::Core(CoreError::NotFound { entity: "Puppy", id }));
    }
    let rows = ReservationRepo::list_for_puppy(&state.pool, id).await?;
    Ok(Json(DataResponse { data: rows }))
}
