//! Breed model and DTOs.

use goldipuppy_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `breeds` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Breed {
    pub id: DbId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub size: Option<String>,
    pub temperament: Option<String>,
    pub life_expectancy: Option<String>,
    pub image: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Descriptive breed fields. Used for both create and full-row update.
#[derive(Debug, Clone, Deserialize)]
pub struct BreedFields {
    pub name: String,
    /// Derived from `name` when omitted.
    pub slug: Option<String>,
    pub description: Option<String>,
    pub size: Option<String>,
    pub temperament: Option<String>,
    pub life_expectancy: Option<String>,
    pub image: Option<String>,
}

/// DTO for `PUT /api/admin/breeds` (the id travels in the body).
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateBreed {
    pub id: DbId,
    #[serde(flatten)]
    pub fields: BreedFields,
}
