//! Handlers for breed records. Reads are public; writes need an admin.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use goldipuppy_core::error::CoreError;
use goldipuppy_db::models::breed::{Breed, BreedFields, UpdateBreed};
use goldipuppy_db::repositories::BreedRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::query::IdParam;
use crate::response::{DataResponse, SuccessResponse};
use crate::state::AppState;

/// GET /api/breeds
pub async fn list_breeds(State(state): State<AppState>) -> AppResult<Json<DataResponse<Vec<Breed>>>> {
    let breeds = BreedRepo::list(&state.pool).await?;
    Ok(Json(DataResponse { data: breeds }))
}

/// GET /api/breeds/{slug}
pub async fn get_breed(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<Json<DataResponse<Breed>>> {
    // Slugs are not ids, so a miss surfaces as a plain row-not-found 404.
    let breed = BreedRepo::find_by_slug(&state.pool, &slug)
        .await?
        .ok_or(AppError::Database(sqlx::Error::RowNotFound))?;
    Ok(Json(DataResponse { data: breed }))
}

/// POST /api/admin/breeds
pub async fn create_breed(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<BreedFields>,
) -> AppResult<(StatusCode, Json<DataResponse<Breed>>)> {
    require_name(&input)?;
    let breed = BreedRepo::create(&state.pool, &input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: breed })))
}

/// PUT /api/admin/breeds
pub async fn update_breed(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<UpdateBreed>,
) -> AppResult<Json<DataResponse<Breed>>> {
    require_name(&input.fields)?;
    let breed = BreedRepo::update(&state.pool, input.id, &input.fields)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Breed",
            id: input.id,
        }))?;
    Ok(Json(DataResponse { data: breed }))
}

/// DELETE /api/admin/breeds?id=
pub async fn delete_breed(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(params): Query<IdParam>,
) -> AppResult<Json<SuccessResponse>> {
    if !BreedRepo::delete(&state.pool, params.id).await? {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Breed",
            id: params.id,
        }));
    }
    Ok(Json(SuccessResponse::ok()))
}

/// A breed without a name would also have no slug.
fn require_name(fields: &BreedFields) -> AppResult<()> {
    if fields.name.trim().is_empty() {
        return Err(AppError::Core(CoreError::Validation("name is required".into())));
    }
    Ok(())
}
