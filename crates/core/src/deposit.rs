//! Deposit reference codes and due-date arithmetic.

use chrono::Duration;
use rand::Rng;
use serde::Serialize;

use crate::lifecycle::DepositStatus;
use crate::types::Timestamp;

/// Prefix of every bank-transfer memo.
pub const DEPOSIT_REFERENCE_PREFIX: &str = "GOLDIPUPPY-";

/// Business grace period between reservation and deposit due date.
pub const DEFAULT_GRACE_PERIOD_DAYS: i64 = 2;

const REFERENCE_TOKEN_LEN: usize = 8;

const MS_PER_DAY: i64 = 86_400_000;

const BASE36_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Build the human-readable bank-transfer reference for a reservation.
///
/// With a known puppy id the reference is derived from its first eight
/// characters, so re-reserving the same puppy repeats the reference.
/// Without one, eight random base36 characters are used.
pub fn deposit_reference(puppy_id: Option<&str>) -> String {
    let token: String = match puppy_id.filter(|id| !id.is_empty()) {
        Some(id) => id.chars().take(REFERENCE_TOKEN_LEN).collect(),
        None => random_base36(REFERENCE_TOKEN_LEN),
    };
    format!("{DEPOSIT_REFERENCE_PREFIX}{}", token.to_uppercase())
}

fn random_base36(len: usize) -> String {
    let mut rng = rand::rng();
    (0..len)
        .map(|_| BASE36_ALPHABET[rng.random_range(0..BASE36_ALPHABET.len())] as char)
        .collect()
}

/// Due date for a deposit reserved at `reserved_at`.
pub fn deposit_due_at(reserved_at: Timestamp, grace_days: i64) -> Timestamp {
    reserved_at + Duration::days(grace_days)
}

/// Whole days left until `due_at`, rounded up.
///
/// `ceil((due_at - now) / 1 day)`; zero or negative means due today or
/// overdue.
pub fn days_remaining(due_at: Timestamp, now: Timestamp) -> i64 {
    let ms = (due_at - now).num_milliseconds();
    (ms + MS_PER_DAY - 1).div_euclid(MS_PER_DAY)
}

/// A pending deposit whose due date has passed.
///
/// Computed on read; no record is mutated.
pub fn is_deposit_expired(status: DepositStatus, due_at: Option<Timestamp>, now: Timestamp) -> bool {
    match (status, due_at) {
        (DepositStatus::Pending, Some(due)) => now > due,
        _ => false,
    }
}

/// Read-side countdown attached to puppy and reservation responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DepositCountdown {
    pub deposit_days_remaining: Option<i64>,
    pub deposit_expired: bool,
}

impl DepositCountdown {
    pub fn compute(status: DepositStatus, due_at: Option<Timestamp>, now: Timestamp) -> Self {
        let days = match status {
            DepositStatus::Pending => due_at.map(|due| days_remaining(due, now)),
            _ => None,
        };
        Self {
            deposit_days_remaining: days,
            deposit_expired: is_deposit_expired(status, due_at, now),
        }
    }
}
