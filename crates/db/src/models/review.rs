//! Customer review model and DTOs.

use goldipuppy_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `reviews` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Review {
    pub id: DbId,
    pub puppy_id: Option<DbId>,
    pub author_name: String,
    pub rating: i16,
    pub text: String,
    pub approved: bool,
    pub created_at: Timestamp,
}

/// DTO for `POST /api/reviews`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateReview {
    pub puppy_id: Option<DbId>,
    pub author_name: String,
    pub rating: i16,
    pub text: String,
}
