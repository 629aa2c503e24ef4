//! Repository for the `puppies` and `puppy_images` tables.
//!
//! Only descriptive fields are written here. The lifecycle columns
//! (`status`, `deposit_*`) change exclusively through
//! [`LifecycleRepo`](super::LifecycleRepo).

use std::collections::HashMap;

use goldipuppy_core::images::{primary_image, ImageList};
use goldipuppy_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::puppy::{CreatePuppy, Puppy, PuppyWithImages, UpdatePuppy};

/// Column list shared across queries to avoid repetition.
pub(crate) const COLUMNS: &str = "id, name, breed, breed_slug, price, currency, status, gender, \
                                   age, size, location, description, image, featured, \
                                   deposit_status, deposit_due_at, deposit_reference, version, \
                                   created_at, updated_at";

/// Result of a versioned full-row update.
#[derive(Debug)]
pub enum UpdateOutcome {
    Updated(PuppyWithImages),
    NotFound,
    /// The caller's `version` no longer matches the stored row.
    VersionMismatch { current: i32 },
}

/// Provides CRUD operations for puppy listings.
pub struct PuppyRepo;

impl PuppyRepo {
    /// List every listing ordered `featured desc, name asc`, with images
    /// assembled from the child rows in `sort_order`.
    pub async fn list(pool: &PgPool, now: Timestamp) -> Result<Vec<PuppyWithImages>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM puppies ORDER BY featured DESC, name ASC");
        let puppies = sqlx::query_as::<_, Puppy>(&query).fetch_all(pool).await?;

        let rows: Vec<(DbId, String)> = sqlx::query_as(
            "SELECT puppy_id, url FROM puppy_images ORDER BY puppy_id, sort_order",
        )
        .fetch_all(pool)
        .await?;

        let mut by_puppy: HashMap<DbId, Vec<String>> = HashMap::new();
        for (puppy_id, url) in rows {
            by_puppy.entry(puppy_id).or_default().push(url);
        }

        Ok(puppies
            .into_iter()
            .map(|p| {
                let images = by_puppy.remove(&p.id).unwrap_or_default();
                PuppyWithImages::new(p, images, now)
            })
            .collect())
    }

    /// Find a listing by ID.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
        now: Timestamp,
    ) -> Result<Option<PuppyWithImages>, sqlx::Error> {
        let Some(puppy) = Self::find_row(pool, id).await? else {
            return Ok(None);
        };
        let images = Self::image_urls(pool, id).await?;
        Ok(Some(PuppyWithImages::new(puppy, images, now)))
    }

    /// Find the bare listing row by ID.
    pub async fn find_row(pool: &PgPool, id: DbId) -> Result<Option<Puppy>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM puppies WHERE id = $1");
        sqlx::query_as::<_, Puppy>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Insert a listing and its ordered images in one transaction.
    ///
    /// New listings start `available` with no deposit. When `images` is
    /// supplied, `image` is set to its first entry.
    pub async fn create(
        pool: &PgPool,
        input: &CreatePuppy,
        default_currency: &str,
        now: Timestamp,
    ) -> Result<PuppyWithImages, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let image = primary_image(input.images.as_ref(), input.image.as_deref());
        let currency = input.currency.as_deref().unwrap_or(default_currency);

        let query = format!(
            "INSERT INTO puppies
                (name, breed, breed_slug, price, currency, gender, age, size, location,
                 description, image, featured)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, COALESCE($12, false))
             RETURNING {COLUMNS}"
        );
        let puppy = sqlx::query_as::<_, Puppy>(&query)
            .bind(&input.name)
            .bind(&input.breed)
            .bind(&input.breed_slug)
            .bind(input.price)
            .bind(currency)
            .bind(&input.gender)
            .bind(&input.age)
            .bind(&input.size)
            .bind(&input.location)
            .bind(&input.description)
            .bind(&image)
            .bind(input.featured)
            .fetch_one(&mut *tx)
            .await?;

        let images = match &input.images {
            Some(list) => {
                Self::replace_images_inner(&mut tx, puppy.id, list).await?;
                list.as_slice().to_vec()
            }
            None => Vec::new(),
        };

        tx.commit().await?;
        Ok(PuppyWithImages::new(puppy, images, now))
    }

    /// Replace every descriptive field of a listing.
    ///
    /// The row is locked for the duration of the transaction so the version
    /// check and the write cannot interleave with another update. Child
    /// image rows are replaced when `images` is supplied; an `image` alone
    /// is moved to the front of the stored rows. Omitted
    /// `currency` and `featured` keep their stored values.
    pub async fn update(
        pool: &PgPool,
        input: &UpdatePuppy,
        now: Timestamp,
    ) -> Result<UpdateOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let current: Option<i32> =
            sqlx::query_scalar("SELECT version FROM puppies WHERE id = $1 FOR UPDATE")
                .bind(input.id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some(current) = current else {
            return Ok(UpdateOutcome::NotFound);
        };
        if input.version.is_some_and(|v| v != current) {
            return Ok(UpdateOutcome::VersionMismatch { current });
        }

        let fields = &input.fields;
        let image = primary_image(fields.images.as_ref(), fields.image.as_deref());

        let query = format!(
            "UPDATE puppies SET
                name = $2,
                breed = $3,
                breed_slug = $4,
                price = $5,
                currency = COALESCE($6, currency),
                gender = $7,
                age = $8,
                size = $9,
                location = $10,
                description = $11,
                image = $12,
                featured = COALESCE($13, featured),
                version = version + 1
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let puppy = sqlx::query_as::<_, Puppy>(&query)
            .bind(input.id)
            .bind(&fields.name)
            .bind(&fields.breed)
            .bind(&fields.breed_slug)
            .bind(fields.price)
            .bind(&fields.currency)
            .bind(&fields.gender)
            .bind(&fields.age)
            .bind(&fields.size)
            .bind(&fields.location)
            .bind(&fields.description)
            .bind(&image)
            .bind(fields.featured)
            .fetch_one(&mut *tx)
            .await?;

        match (&fields.images, image.as_deref()) {
            (Some(list), _) => Self::replace_images_inner(&mut tx, puppy.id, list).await?,
            // A new primary without a list reorders the stored images so the
            // read model, which takes the primary from them, reflects it.
            (None, Some(primary)) => {
                let stored: Vec<String> = sqlx::query_scalar(
                    "SELECT url FROM puppy_images WHERE puppy_id = $1 ORDER BY sort_order",
                )
                .bind(puppy.id)
                .fetch_all(&mut *tx)
                .await?;
                if stored.first().is_some_and(|first| first != primary) {
                    let list = ImageList::new(stored).with_primary(primary);
                    Self::replace_images_inner(&mut tx, puppy.id, &list).await?;
                }
            }
            (None, None) => {}
        }

        let images: Vec<String> = sqlx::query_scalar(
            "SELECT url FROM puppy_images WHERE puppy_id = $1 ORDER BY sort_order",
        )
        .bind(puppy.id)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(UpdateOutcome::Updated(PuppyWithImages::new(puppy, images, now)))
    }

    /// Delete a listing. Its images cascade; its reservations are kept as
    /// history, and an open hold on it is closed as `cancelled`.
    ///
    /// Returns the image URLs the listing referenced so the caller can
    /// clean up stored files, or `None` if no row matched.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<Option<Vec<String>>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let image: Option<Option<String>> =
            sqlx::query_scalar("SELECT image FROM puppies WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some(image) = image else {
            return Ok(None);
        };

        let mut urls: Vec<String> = sqlx::query_scalar(
            "SELECT url FROM puppy_images WHERE puppy_id = $1 ORDER BY sort_order",
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;
        if let Some(image) = image {
            if !urls.contains(&image) {
                urls.push(image);
            }
        }

        sqlx::query(
            "UPDATE reservations SET status = 'cancelled' \
             WHERE puppy_id = $1 AND status = 'pending'",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM puppies WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(urls))
    }

    async fn image_urls(pool: &PgPool, puppy_id: DbId) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar("SELECT url FROM puppy_images WHERE puppy_id = $1 ORDER BY sort_order")
            .bind(puppy_id)
            .fetch_all(pool)
            .await
    }

    /// Replace all image rows of a listing inside an existing transaction.
    async fn replace_images_inner(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        puppy_id: DbId,
        images: &ImageList,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM puppy_images WHERE puppy_id = $1")
            .bind(puppy_id)
            .execute(&mut **tx)
            .await?;

        for (sort_order, url) in images.with_sort_order() {
            sqlx::query("INSERT INTO puppy_images (puppy_id, url, sort_order) VALUES ($1, $2, $3)")
                .bind(puppy_id)
                .bind(url)
                .bind(sort_order)
                .execute(&mut **tx)
                .await?;
        }

        Ok(())
    }
}
