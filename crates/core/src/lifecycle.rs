//! Reservation / deposit lifecycle of a puppy listing.
//!
//! A puppy's lifecycle state is the composite of its `status` and
//! `deposit_status` columns:
//!
//! | State             | `status`    | `deposit_status` |
//! |-------------------|-------------|------------------|
//! | `Available`       | `available` | `none`           |
//! | `AwaitingDeposit` | `reserved`  | `pending`        |
//! | `Confirmed`       | `reserved`  | `paid`           |
//! | `Sold`            | `sold`      | `none`           |
//!
//! Any other combination is inconsistent. The DB layer uses
//! [`Transition::allowed_from`] to build compare-and-swap updates, so a
//! transition only applies when the row is still in an accepted state.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Column enums
// ---------------------------------------------------------------------------

/// Value of `puppies.status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PuppyStatus {
    Available,
    Reserved,
    Sold,
}

impl PuppyStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Reserved => "reserved",
            Self::Sold => "sold",
        }
    }
}

impl FromStr for PuppyStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(Self::Available),
            "reserved" => Ok(Self::Reserved),
            "sold" => Ok(Self::Sold),
            other => Err(CoreError::Validation(format!(
                "Invalid puppy status '{other}'. Must be one of: available, reserved, sold"
            ))),
        }
    }
}

/// Value of `puppies.deposit_status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DepositStatus {
    None,
    Pending,
    Paid,
}

impl DepositStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Pending => "pending",
            Self::Paid => "paid",
        }
    }
}

impl FromStr for DepositStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            other => Err(CoreError::Validation(format!(
                "Invalid deposit status '{other}'. Must be one of: none, pending, paid"
            ))),
        }
    }
}

/// Value of `reservations.status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    Pending,
    Paid,
    Cancelled,
    Expired,
}

impl ReservationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Cancelled => "cancelled",
            Self::Expired => "expired",
        }
    }
}

impl FromStr for ReservationStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "cancelled" => Ok(Self::Cancelled),
            "expired" => Ok(Self::Expired),
            other => Err(CoreError::Validation(format!(
                "Invalid reservation status '{other}'. \
                 Must be one of: pending, paid, cancelled, expired"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// LifecycleState
// ---------------------------------------------------------------------------

/// Composite lifecycle state of a puppy listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    Available,
    AwaitingDeposit,
    Confirmed,
    Sold,
}

impl LifecycleState {
    /// Combine the two status columns, rejecting inconsistent pairs.
    pub fn from_parts(status: PuppyStatus, deposit: DepositStatus) -> Result<Self, CoreError> {
        match (status, deposit) {
            (PuppyStatus::Available, DepositStatus::None) => Ok(Self::Available),
            (PuppyStatus::Reserved, DepositStatus::Pending) => Ok(Self::AwaitingDeposit),
            (PuppyStatus::Reserved, DepositStatus::Paid) => Ok(Self::Confirmed),
            (PuppyStatus::Sold, DepositStatus::None) => Ok(Self::Sold),
            (s, d) => Err(CoreError::Internal(format!(
                "Inconsistent lifecycle state: status={}, deposit_status={}",
                s.as_str(),
                d.as_str()
            ))),
        }
    }

    /// Parse the raw column values of a puppy row.
    pub fn parse(status: &str, deposit_status: &str) -> Result<Self, CoreError> {
        Self::from_parts(status.parse()?, deposit_status.parse()?)
    }

    pub fn puppy_status(self) -> PuppyStatus {
        match self {
            Self::Available => PuppyStatus::Available,
            Self::AwaitingDeposit | Self::Confirmed => PuppyStatus::Reserved,
            Self::Sold => PuppyStatus::Sold,
        }
    }

    pub fn deposit_status(self) -> DepositStatus {
        match self {
            Self::AwaitingDeposit => DepositStatus::Pending,
            Self::Confirmed => DepositStatus::Paid,
            Self::Available | Self::Sold => DepositStatus::None,
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Available => "available",
            Self::AwaitingDeposit => "awaiting deposit",
            Self::Confirmed => "confirmed",
            Self::Sold => "sold",
        };
        f.write_str(name)
    }
}

/// Whether a `(status, deposit_status)` pair is one of the four legal states.
///
/// Equivalent to `deposit_status != none <=> status == reserved`.
pub fn invariant_holds(status: &str, deposit_status: &str) -> bool {
    LifecycleState::parse(status, deposit_status).is_ok()
}

// ---------------------------------------------------------------------------
// Transitions
// ---------------------------------------------------------------------------

/// Why a held puppy is being released back to `Available`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReleaseReason {
    /// The deposit was not received by the due date.
    Expired,
    /// An operator cancelled the hold.
    Cancelled,
    /// The customer cancelled their own reservation.
    CustomerCancelled,
}

impl ReleaseReason {
    /// Status the pending reservation row receives on release.
    pub fn reservation_status(self) -> ReservationStatus {
        match self {
            Self::Expired => ReservationStatus::Expired,
            Self::Cancelled | Self::CustomerCancelled => ReservationStatus::Cancelled,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Expired => "expired",
            Self::Cancelled => "cancelled",
            Self::CustomerCancelled => "customer_cancelled",
        }
    }
}

/// A lifecycle transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Customer submits a reservation: `Available -> AwaitingDeposit`.
    Reserve,
    /// Operator confirms the deposit arrived: `AwaitingDeposit -> Confirmed`.
    ConfirmDeposit,
    /// Hold released: `AwaitingDeposit -> Available`.
    Release(ReleaseReason),
    /// Operator records the sale: `Available | Confirmed -> Sold`.
    MarkSold,
}

impl Transition {
    /// States from which this transition may be applied.
    pub fn allowed_from(self) -> &'static [LifecycleState] {
        match self {
            Self::Reserve => &[LifecycleState::Available],
            Self::ConfirmDeposit | Self::Release(_) => &[LifecycleState::AwaitingDeposit],
            Self::MarkSold => &[LifecycleState::Available, LifecycleState::Confirmed],
        }
    }

    pub fn target(self) -> LifecycleState {
        match self {
            Self::Reserve => LifecycleState::AwaitingDeposit,
            Self::ConfirmDeposit => LifecycleState::Confirmed,
            Self::Release(_) => LifecycleState::Available,
            Self::MarkSold => LifecycleState::Sold,
        }
    }

    /// Event type recorded in the audit log when the transition commits.
    pub fn event_type(self) -> &'static str {
        match self {
            Self::Reserve => "puppy.reserved",
            Self::ConfirmDeposit => "deposit.confirmed",
            Self::Release(_) => "deposit.released",
            Self::MarkSold => "puppy.sold",
        }
    }

    /// Check the transition against a known current state.
    pub fn apply(self, from: LifecycleState) -> Result<LifecycleState, CoreError> {
        if self.allowed_from().contains(&from) {
            Ok(self.target())
        } else {
            Err(CoreError::Conflict(format!(
                "Cannot {} a puppy that is {from}",
                self.verb()
            )))
        }
    }

    fn verb(self) -> &'static str {
        match self {
            Self::Reserve => "reserve",
            Self::ConfirmDeposit => "confirm the deposit of",
            Self::Release(_) => "release",
            Self::MarkSold => "mark as sold",
        }
    }
}

/// Check whether a customer may cancel their own reservation.
///
/// Allowed only while the reservation is `pending` and `now <= due_at`.
pub fn check_self_cancel(
    status: ReservationStatus,
    due_at: Timestamp,
    now: Timestamp,
) -> Result<(), CoreError> {
    if status != ReservationStatus::Pending {
        return Err(CoreError::Conflict(format!(
            "Only pending reservations can be cancelled (current status: {})",
            status.as_str()
        )));
    }
    if now > due_at {
        return Err(CoreError::Conflict(
            "The deposit due date has passed; contact us to cancel this reservation".into(),
        ));
    }
    Ok(())
}
