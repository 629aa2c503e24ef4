//! Handlers for customer reviews and their moderation.
//!
//! New reviews are stored unapproved and only appear publicly once an
//! admin approves them.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use goldipuppy_core::error::CoreError;
use goldipuppy_core::review::{validate_rating, validate_review_text};
use goldipuppy_core::types::DbId;
use goldipuppy_db::models::review::{CreateReview, Review};
use goldipuppy_db::repositories::ReviewRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::response::{DataResponse, SuccessResponse};
use crate::state::AppState;

/// GET /api/reviews
pub async fn list_approved(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<Review>>>> {
    let reviews = ReviewRepo::list_approved(&state.pool).await?;
    Ok(Json(DataResponse { data: reviews }))
}

/// POST /api/reviews
pub async fn create_review(
    State(state): State<AppState>,
    Json(input): Json<CreateReview>,
) -> AppResult<(StatusCode, Json<DataResponse<Review>>)> {
    if input.author_name.trim().is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "author_name is required".into(),
        )));
    }
    validate_rating(input.rating)?;
    validate_review_text(&input.text)?;

    let review = ReviewRepo::create(&state.pool, &input).await?;
    tracing::info!(review_id = %review.id, rating = review.rating, "Review submitted");
    Ok((StatusCode::CREATED, Json(DataResponse { data: review })))
}

/// GET /api/admin/reviews
///
/// Every review, unapproved first.
pub async fn list_all(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<Review>>>> {
    let reviews = ReviewRepo::list_all(&state.pool).await?;
    Ok(Json(DataResponse { data: reviews }))
}

/// PUT /api/admin/reviews/{id}/approve
pub async fn approve_review(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Review>>> {
    let review = ReviewRepo::approve(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Review", id }))?;
    Ok(Json(DataResponse { data: review }))
}

/// DELETE /api/admin/reviews/{id}
pub async fn delete_review(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<SuccessResponse>> {
    if !ReviewRepo::delete(&state.pool, id).await? {
        return Err(AppError::Core(CoreError::NotFound { entity: "Review", id }));
    }
    Ok(Json(SuccessResponse::ok()))
}
