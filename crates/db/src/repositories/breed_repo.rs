//! Repository for the `breeds` table.

use goldipuppy_core::catalog::slugify;
use goldipuppy_core::types::DbId;
use sqlx::PgPool;

use crate::models::breed::{Breed, BreedFields};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, name, slug, description, size, temperament, life_expectancy, \
                        image, created_at, updated_at";

/// Provides CRUD operations for breeds.
pub struct BreedRepo;

impl BreedRepo {
    /// List all breeds alphabetically.
    pub async fn list(pool: &PgPool) -> Result<Vec<Breed>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM breeds ORDER BY name");
        sqlx::query_as::<_, Breed>(&query).fetch_all(pool).await
    }

    /// Find a breed by its URL slug.
    pub async fn find_by_slug(pool: &PgPool, slug: &str) -> Result<Option<Breed>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM breeds WHERE slug = $1");
        sqlx::query_as::<_, Breed>(&query)
            .bind(slug)
            .fetch_optional(pool)
            .await
    }

    /// Insert a breed. The slug is derived from the name when not supplied.
    pub async fn create(pool: &PgPool, input: &BreedFields) -> Result<Breed, sqlx::Error> {
        let query = format!(
            "INSERT INTO breeds (name, slug, description, size, temperament, life_expectancy, image)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Breed>(&query)
            .bind(&input.name)
            .bind(slug_for(input))
            .bind(&input.description)
            .bind(&input.size)
            .bind(&input.temperament)
            .bind(&input.life_expectancy)
            .bind(&input.image)
            .fetch_one(pool)
            .await
    }

    /// Replace every descriptive field of a breed.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &BreedFields,
    ) -> Result<Option<Breed>, sqlx::Error> {
        let query = format!(
            "UPDATE breeds SET
                name = $2,
                slug = $3,
                description = $4,
                size = $5,
                temperament = $6,
                life_expectancy = $7,
                image = $8
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Breed>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(slug_for(input))
            .bind(&input.description)
            .bind(&input.size)
            .bind(&input.temperament)
            .bind(&input.life_expectancy)
            .bind(&input.image)
            .fetch_optional(pool)
            .await
    }

    /// Permanently delete a breed. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM breeds WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn slug_for(input: &BreedFields) -> String {
    match input.slug.as_deref().map(str::trim) {
        Some(slug) if !slug.is_empty() => slug.to_string(),
        _ => slugify(&input.name),
    }
}
