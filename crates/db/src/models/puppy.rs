//! Puppy listing model and DTOs.

use goldipuppy_core::catalog::CatalogEntry;
use goldipuppy_core::deposit::DepositCountdown;
use goldipuppy_core::error::CoreError;
use goldipuppy_core::images::ImageList;
use goldipuppy_core::lifecycle::{DepositStatus, LifecycleState};
use goldipuppy_core::types::{DbId, Money, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `puppies` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Puppy {
    pub id: DbId,
    pub name: String,
    pub breed: String,
    pub breed_slug: Option<String>,
    pub price: Money,
    pub currency: String,
    pub status: String,
    pub gender: Option<String>,
    pub age: Option<String>,
    pub size: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub featured: bool,
    pub deposit_status: String,
    pub deposit_due_at: Option<Timestamp>,
    pub deposit_reference: Option<String>,
    pub version: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Puppy {
    /// Composite lifecycle state of this row.
    pub fn lifecycle_state(&self) -> Result<LifecycleState, CoreError> {
        LifecycleState::parse(&self.status, &self.deposit_status)
    }

    /// Parsed deposit status; unknown values read as `none`.
    pub fn deposit_status(&self) -> DepositStatus {
        self.deposit_status.parse().unwrap_or(DepositStatus::None)
    }
}

/// A listing with its ordered images and deposit countdown, as served by
/// the API.
#[derive(Debug, Clone, Serialize)]
pub struct PuppyWithImages {
    #[serde(flatten)]
    pub puppy: Puppy,
    pub images: ImageList,
    #[serde(flatten)]
    pub countdown: DepositCountdown,
}

impl PuppyWithImages {
    /// Assemble the read model.
    ///
    /// When child image rows exist the primary `image` is taken from them so
    /// that `images[0] == image` always holds on read.
    pub fn new(mut puppy: Puppy, child_images: Vec<String>, now: Timestamp) -> Self {
        let images = ImageList::resolve(child_images, puppy.image.as_deref());
        if let Some(primary) = images.primary() {
            puppy.image = Some(primary.to_string());
        }
        let countdown = DepositCountdown::compute(puppy.deposit_status(), puppy.deposit_due_at, now);
        Self {
            puppy,
            images,
            countdown,
        }
    }
}

impl CatalogEntry for PuppyWithImages {
    fn name(&self) -> &str {
        &self.puppy.name
    }

    fn breed_slug(&self) -> Option<&str> {
        self.puppy.breed_slug.as_deref()
    }

    fn status(&self) -> &str {
        &self.puppy.status
    }

    fn gender(&self) -> Option<&str> {
        self.puppy.gender.as_deref()
    }

    fn price(&self) -> Money {
        self.puppy.price
    }

    fn featured(&self) -> bool {
        self.puppy.featured
    }

    fn created_at(&self) -> Timestamp {
        self.puppy.created_at
    }
}

/// Descriptive listing fields, shared by create and full-row update.
///
/// Lifecycle columns (`status`, `deposit_*`) are deliberately absent: they
/// only change through lifecycle transitions.
#[derive(Debug, Clone, Deserialize)]
pub struct PuppyFields {
    pub name: String,
    pub breed: String,
    pub breed_slug: Option<String>,
    pub price: Money,
    /// ISO-4217 code; the store default applies when omitted.
    pub currency: Option<String>,
    pub gender: Option<String>,
    pub age: Option<String>,
    pub size: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    /// Ordered image URLs. When present, replaces all stored images.
    pub images: Option<ImageList>,
    pub featured: Option<bool>,
}

/// DTO for `POST /api/admin/puppies`.
pub type CreatePuppy = PuppyFields;

/// DTO for `PUT /api/admin/puppies` (the id travels in the body).
#[derive(Debug, Clone, Deserialize)]
pub struct UpdatePuppy {
    pub id: DbId,
    /// Optimistic concurrency token. When supplied it must match the
    /// stored version or the update is rejected.
    pub version: Option<i32>,
    #[serde(flatten)]
    pub fields: PuppyFields,
}
