//! Read access to the `reservations` table.
//!
//! Reservations are only written by [`LifecycleRepo`](super::LifecycleRepo).

use goldipuppy_core::lifecycle::ReservationStatus;
use goldipuppy_core::types::DbId;
use sqlx::PgPool;

use crate::models::reservation::{Reservation, ReservationSummary};

/// Column list shared across queries to avoid repetition.
pub(crate) const COLUMNS: &str = "id, puppy_id, user_id, status, deposit_due_at, \
                                   deposit_reference, customer_name, customer_email, \
                                   customer_phone, message, created_at, updated_at";

/// Reservation columns joined with the listing they hold. The listing may
/// have been deleted since, in which case its columns read as NULL.
const SUMMARY_SELECT: &str = "SELECT r.id, r.puppy_id, r.user_id, r.status, r.deposit_due_at, \
                                 r.deposit_reference, r.customer_name, r.customer_email, \
                                 r.customer_phone, r.message, r.created_at, r.updated_at, \
                                 p.name AS puppy_name, p.breed AS puppy_breed, \
                                 p.image AS puppy_image, p.price AS puppy_price, \
                                 p.currency AS puppy_currency \
                              FROM reservations r \
                              LEFT JOIN puppies p ON p.id = r.puppy_id";

/// Provides query operations for reservations.
pub struct ReservationRepo;

impl ReservationRepo {
    /// Find a reservation by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Reservation>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM reservations WHERE id = $1");
        sqlx::query_as::<_, Reservation>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List a user's reservations, newest first.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<ReservationSummary>, sqlx::Error> {
        let query = format!("{SUMMARY_SELECT} WHERE r.user_id = $1 ORDER BY r.created_at DESC");
        sqlx::query_as::<_, ReservationSummary>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// List all reservations, optionally filtered by status, newest first.
    pub async fn list_all(
        pool: &PgPool,
        status: Option<ReservationStatus>,
    ) -> Result<Vec<ReservationSummary>, sqlx::Error> {
        let query = format!(
            "{SUMMARY_SELECT} WHERE ($1::TEXT IS NULL OR r.status = $1) ORDER BY r.created_at DESC"
        );
        sqlx::query_as::<_, ReservationSummary>(&query)
            .bind(status.map(ReservationStatus::as_str))
            .fetch_all(pool)
            .await
    }

    /// Every reservation ever made for a listing, newest first.
    pub async fn list_for_puppy(
        pool: &PgPool,
        puppy_id: DbId,
    ) -> Result<Vec<Reservation>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM reservations WHERE puppy_id = $1 ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, Reservation>(&query)
            .bind(puppy_id)
            .fetch_all(pool)
            .await
    }
}
