//! Repository for the `reviews` table.

use goldipuppy_core::types::DbId;
use sqlx::PgPool;

use crate::models::review::{CreateReview, Review};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, puppy_id, author_name, rating, text, approved, created_at";

/// Provides CRUD and moderation operations for reviews.
pub struct ReviewRepo;

impl ReviewRepo {
    /// Insert a review. New reviews start unapproved.
    pub async fn create(pool: &PgPool, input: &CreateReview) -> Result<Review, sqlx::Error> {
        let query = format!(
            "INSERT INTO reviews (puppy_id, author_name, rating, text)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Review>(&query)
            .bind(input.puppy_id)
            .bind(&input.author_name)
            .bind(input.rating)
            .bind(&input.text)
            .fetch_one(pool)
            .await
    }

    /// List approved reviews, newest first.
    pub async fn list_approved(pool: &PgPool) -> Result<Vec<Review>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM reviews WHERE approved = true ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, Review>(&query).fetch_all(pool).await
    }

    /// List every review, unapproved first, for moderation.
    pub async fn list_all(pool: &PgPool) -> Result<Vec<Review>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM reviews ORDER BY approved ASC, created_at DESC");
        sqlx::query_as::<_, Review>(&query).fetch_all(pool).await
    }

    /// Mark a review approved. Returns `None` if it does not exist.
    pub async fn approve(pool: &PgPool, id: DbId) -> Result<Option<Review>, sqlx::Error> {
        let query = format!("UPDATE reviews SET approved = true WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, Review>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Permanently delete a review. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
