//! Reservation model and DTOs.
//!
//! Reservation rows are the history of holds on a listing; the listing's
//! own `status`/`deposit_*` columns are the current projection.

use goldipuppy_core::contact::CustomerContact;
use goldipuppy_core::deposit::DepositCountdown;
use goldipuppy_core::lifecycle::{DepositStatus, ReservationStatus};
use goldipuppy_core::types::{DbId, Money, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `reservations` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Reservation {
    pub id: DbId,
    pub puppy_id: DbId,
    pub user_id: DbId,
    pub status: String,
    pub deposit_due_at: Timestamp,
    pub deposit_reference: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub message: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Reservation {
    /// Parsed status; unknown values read as `cancelled`.
    pub fn status(&self) -> ReservationStatus {
        self.status.parse().unwrap_or(ReservationStatus::Cancelled)
    }
}

/// A reservation joined with the listing it holds, for dashboards.
///
/// The `puppy_*` fields are `None` once the listing has been deleted.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ReservationSummary {
    pub id: DbId,
    pub puppy_id: DbId,
    pub user_id: DbId,
    pub status: String,
    pub deposit_due_at: Timestamp,
    pub deposit_reference: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub message: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub puppy_name: Option<String>,
    pub puppy_breed: Option<String>,
    pub puppy_image: Option<String>,
    pub puppy_price: Option<Money>,
    pub puppy_currency: Option<String>,
}

/// Reservation summary with the read-side deposit countdown.
#[derive(Debug, Clone, Serialize)]
pub struct ReservationView {
    #[serde(flatten)]
    pub reservation: ReservationSummary,
    #[serde(flatten)]
    pub countdown: DepositCountdown,
}

impl ReservationView {
    pub fn new(reservation: ReservationSummary, now: Timestamp) -> Self {
        // Only an open hold has a running countdown.
        let deposit = if reservation.status == ReservationStatus::Pending.as_str() {
            DepositStatus::Pending
        } else {
            DepositStatus::None
        };
        let countdown = DepositCountdown::compute(deposit, Some(reservation.deposit_due_at), now);
        Self {
            reservation,
            countdown,
        }
    }
}

/// DTO for `POST /api/reservations`.
#[derive(Debug, Clone, Deserialize)]
pub struct ReserveRequest {
    pub puppy_id: DbId,
    #[serde(flatten)]
    pub contact: CustomerContact,
}

/// DTO for `PUT /api/reservations`.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateReservationRequest {
    pub id: DbId,
    pub status: ReservationStatus,
}

/// Query parameters for the admin reservation list.
#[derive(Debug, Clone, Deserialize)]
pub struct ReservationListParams {
    pub status: Option<ReservationStatus>,
}
