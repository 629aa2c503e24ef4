//! Handlers for puppy listings: the public catalog and the admin CRUD.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use goldipuppy_core::catalog::CatalogQuery;
use goldipuppy_core::error::CoreError;
use goldipuppy_core::types::DbId;
use goldipuppy_db::models::event::Event;
use goldipuppy_db::models::puppy::{CreatePuppy, PuppyWithImages, UpdatePuppy};
use goldipuppy_db::repositories::{EventRepo, PuppyRepo, UpdateOutcome};

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::query::IdParam;
use crate::response::{DataResponse, SuccessResponse};
use crate::state::AppState;
use crate::storage::delete_images_best_effort;

// ---------------------------------------------------------------------------
// Public catalog
// ---------------------------------------------------------------------------

/// GET /api/puppies
///
/// Filtered and sorted catalog. Defaults to featured first, then by name.
pub async fn list_catalog(
    State(state): State<AppState>,
    Query(query): Query<CatalogQuery>,
) -> AppResult<Json<DataResponse<Vec<PuppyWithImages>>>> {
    let puppies = PuppyRepo::list(&state.pool, Utc::now()).await?;
    Ok(Json(DataResponse {
        data: query.apply(puppies),
    }))
}

/// GET /api/puppies/{id}
pub async fn get_puppy(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<PuppyWithImages>>> {
    let puppy = PuppyRepo::find_by_id(&state.pool, id, Utc::now())
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Puppy", id }))?;
    Ok(Json(DataResponse { data: puppy }))
}

// ---------------------------------------------------------------------------
// Admin CRUD
// ---------------------------------------------------------------------------

/// GET /api/admin/puppies
///
/// Every listing, `featured desc, name asc`.
pub async fn list_puppies(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<PuppyWithImages>>>> {
    let puppies = PuppyRepo::list(&state.pool, Utc::now()).await?;
    Ok(Json(DataResponse { data: puppies }))
}

/// POST /api/admin/puppies
pub async fn create_puppy(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<CreatePuppy>,
) -> AppResult<(StatusCode, Json<DataResponse<PuppyWithImages>>)> {
    let puppy =
        PuppyRepo::create(&state.pool, &input, &state.config.store.currency, Utc::now()).await?;
    tracing::info!(
        puppy_id = %puppy.puppy.id,
        admin_id = %admin.user_id,
        "Puppy listing created"
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: puppy })))
}

/// PUT /api/admin/puppies
///
/// Full replacement of the descriptive fields; the id travels in the body.
/// A supplied `version` that no longer matches is a 409.
pub async fn update_puppy(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<UpdatePuppy>,
) -> AppResult<Json<DataResponse<PuppyWithImages>>> {
    match PuppyRepo::update(&state.pool, &input, Utc::now()).await? {
        UpdateOutcome::Updated(puppy) => Ok(Json(DataResponse { data: puppy })),
        UpdateOutcome::NotFound => Err(AppError::Core(CoreError::NotFound {
            entity: "Puppy",
            id: input.id,
        })),
        UpdateOutcome::VersionMismatch { current } => {
            Err(AppError::Core(CoreError::Conflict(format!(
                "Puppy was modified concurrently (current version {current})"
            ))))
        }
    }
}

/// DELETE /api/admin/puppies?id=
///
/// Deletes the listing, then its stored image files. File removal failures
/// are logged and do not affect the response.
pub async fn delete_puppy(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Query(params): Query<IdParam>,
) -> AppResult<Json<SuccessResponse>> {
    let urls = PuppyRepo::delete(&state.pool, params.id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Puppy",
            id: params.id,
        }))?;

    let removed = delete_images_best_effort(state.images.as_ref(), &urls).await;
    tracing::info!(
        puppy_id = %params.id,
        admin_id = %admin.user_id,
        images_removed = removed,
        "Puppy listing deleted"
    );
    Ok(Json(SuccessResponse::ok()))
}

/// GET /api/admin/puppies/{id}/events
///
/// Lifecycle audit trail of a listing, newest first.
pub async fn list_puppy_events(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<Event>>>> {
    let events = EventRepo::list_for_entity(&state.pool, "puppy", id).await?;
    Ok(Json(DataResponse { data: events }))
}
