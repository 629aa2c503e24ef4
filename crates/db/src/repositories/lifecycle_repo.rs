//! Transactional reservation/deposit lifecycle transitions.
//!
//! Every transition runs in a single transaction that performs a
//! compare-and-swap update of the puppy row (guarded by the transition's
//! accepted source states), updates or inserts the reservation row,
//! enqueues outbox notifications and records an audit event. Either all of
//! it commits or none of it does.

use goldipuppy_core::contact::CustomerContact;
use goldipuppy_core::deposit::{deposit_due_at, deposit_reference};
use goldipuppy_core::error::CoreError;
use goldipuppy_core::lifecycle::{
    check_self_cancel, LifecycleState, ReleaseReason, ReservationStatus, Transition,
};
use goldipuppy_core::types::{DbId, Timestamp};
use serde_json::json;
use sqlx::{PgPool, Postgres, Transaction};

use super::event_repo::EventRepo;
use super::notification_repo::NotificationRepo;
use super::puppy_repo::COLUMNS as PUPPY_COLUMNS;
use super::reservation_repo::COLUMNS as RESERVATION_COLUMNS;
use crate::models::notification::NewOutboxMessage;
use crate::models::puppy::Puppy;
use crate::models::reservation::Reservation;

/// Entity type recorded on lifecycle audit events.
const ENTITY_PUPPY: &str = "puppy";

/// Failure of a lifecycle transition.
#[derive(Debug, thiserror::Error)]
pub enum TransitionError {
    /// The transition was rejected (unknown entity, wrong state, ...).
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Result of a committed transition.
#[derive(Debug, Clone)]
pub struct TransitionOutcome {
    pub transition: Transition,
    /// The puppy row after the transition.
    pub puppy: Puppy,
    /// The reservation row touched by the transition, if any.
    pub reservation: Option<Reservation>,
    /// Whether the puppy row itself changed state.
    pub puppy_changed: bool,
}

/// Who triggered a transition and when.
#[derive(Debug, Clone, Copy)]
pub struct Actor {
    /// `None` for system-initiated transitions such as the expiry sweep.
    pub user_id: Option<DbId>,
    pub now: Timestamp,
}

/// Provides the lifecycle transitions of a puppy listing.
pub struct LifecycleRepo;

impl LifecycleRepo {
    /// `Available -> AwaitingDeposit`: a customer reserves a puppy.
    ///
    /// Two concurrent calls for the same puppy cannot both succeed: the
    /// second finds the row no longer `available` and gets a conflict.
    pub async fn reserve<F>(
        pool: &PgPool,
        puppy_id: DbId,
        user_id: DbId,
        contact: &CustomerContact,
        grace_days: i64,
        now: Timestamp,
        notify: F,
    ) -> Result<TransitionOutcome, TransitionError>
    where
        F: FnOnce(&Puppy, Option<&Reservation>) -> Vec<NewOutboxMessage>,
    {
        let transition = Transition::Reserve;
        let target = transition.target();
        let reference = deposit_reference(Some(&puppy_id.to_string()));
        let due_at = deposit_due_at(now, grace_days);

        let mut tx = pool.begin().await?;

        let query = format!(
            "UPDATE puppies SET
                status = $2,
                deposit_status = $3,
                deposit_due_at = $4,
                deposit_reference = $5,
                version = version + 1
             WHERE id = $1 AND ({})
             RETURNING {PUPPY_COLUMNS}",
            state_predicate(transition.allowed_from())
        );
        let puppy = sqlx::query_as::<_, Puppy>(&query)
            .bind(puppy_id)
            .bind(target.puppy_status().as_str())
            .bind(target.deposit_status().as_str())
            .bind(due_at)
            .bind(&reference)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(puppy) = puppy else {
            return Err(rejection(&mut tx, puppy_id, transition).await);
        };

        let query = format!(
            "INSERT INTO reservations
                (puppy_id, user_id, status, deposit_due_at, deposit_reference,
                 customer_name, customer_email, customer_phone, message, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             RETURNING {RESERVATION_COLUMNS}"
        );
        let reservation = sqlx::query_as::<_, Reservation>(&query)
            .bind(puppy_id)
            .bind(user_id)
            .bind(ReservationStatus::Pending.as_str())
            .bind(due_at)
            .bind(&reference)
            .bind(contact.customer_name.trim())
            .bind(contact.customer_email.trim())
            .bind(&contact.customer_phone)
            .bind(&contact.message)
            .bind(now)
            .fetch_one(&mut *tx)
            .await?;

        let actor = Actor {
            user_id: Some(user_id),
            now,
        };
        finish(
            tx,
            transition,
            LifecycleState::Available,
            actor,
            puppy,
            Some(reservation),
            true,
            notify,
        )
        .await
    }

    /// `AwaitingDeposit -> Confirmed`: the operator received the deposit.
    ///
    /// The most recent pending reservation becomes `paid`. When there is
    /// none the puppy still transitions and the outcome carries no
    /// reservation.
    pub async fn confirm_deposit<F>(
        pool: &PgPool,
        puppy_id: DbId,
        actor: Actor,
        notify: F,
    ) -> Result<TransitionOutcome, TransitionError>
    where
        F: FnOnce(&Puppy, Option<&Reservation>) -> Vec<NewOutboxMessage>,
    {
        let transition = Transition::ConfirmDeposit;
        let target = transition.target();
        let mut tx = pool.begin().await?;

        let query = format!(
            "UPDATE puppies SET
                deposit_status = $2,
                version = version + 1
             WHERE id = $1 AND ({})
             RETURNING {PUPPY_COLUMNS}",
            state_predicate(transition.allowed_from())
        );
        let puppy = sqlx::query_as::<_, Puppy>(&query)
            .bind(puppy_id)
            .bind(target.deposit_status().as_str())
            .fetch_optional(&mut *tx)
            .await?;
        let Some(puppy) = puppy else {
            return Err(rejection(&mut tx, puppy_id, transition).await);
        };

        let reservation = settle_latest_pending(&mut tx, puppy_id, ReservationStatus::Paid).await?;
        if reservation.is_none() {
            tracing::warn!(
                puppy_id = %puppy_id,
                "Deposit confirmed without a pending reservation",
            );
        }

        finish(
            tx,
            transition,
            LifecycleState::AwaitingDeposit,
            actor,
            puppy,
            reservation,
            true,
            notify,
        )
        .await
    }

    /// `AwaitingDeposit -> Available`: the operator releases a hold.
    ///
    /// The most recent pending reservation becomes `expired` or
    /// `cancelled` according to `reason`.
    pub async fn release<F>(
        pool: &PgPool,
        puppy_id: DbId,
        reason: ReleaseReason,
        actor: Actor,
        notify: F,
    ) -> Result<TransitionOutcome, TransitionError>
    where
        F: FnOnce(&Puppy, Option<&Reservation>) -> Vec<NewOutboxMessage>,
    {
        Self::release_inner(pool, puppy_id, reason, actor, false, notify).await
    }

    /// Release a hold whose deposit due date has passed.
    ///
    /// Used by the expiry sweep. The due date is re-checked inside the
    /// compare-and-swap, so a hold confirmed or released concurrently is
    /// left alone (the call then returns a conflict).
    pub async fn release_expired<F>(
        pool: &PgPool,
        puppy_id: DbId,
        now: Timestamp,
        notify: F,
    ) -> Result<TransitionOutcome, TransitionError>
    where
        F: FnOnce(&Puppy, Option<&Reservation>) -> Vec<NewOutboxMessage>,
    {
        let actor = Actor { user_id: None, now };
        Self::release_inner(pool, puppy_id, ReleaseReason::Expired, actor, true, notify).await
    }

    async fn release_inner<F>(
        pool: &PgPool,
        puppy_id: DbId,
        reason: ReleaseReason,
        actor: Actor,
        only_overdue: bool,
        notify: F,
    ) -> Result<TransitionOutcome, TransitionError>
    where
        F: FnOnce(&Puppy, Option<&Reservation>) -> Vec<NewOutboxMessage>,
    {
        let transition = Transition::Release(reason);
        let mut tx = pool.begin().await?;

        let overdue = if only_overdue {
            " AND deposit_due_at < $4"
        } else {
            ""
        };
        let query = format!(
            "UPDATE puppies SET
                status = $2,
                deposit_status = $3,
                deposit_due_at = NULL,
                deposit_reference = NULL,
                version = version + 1
             WHERE id = $1 AND ({}){overdue}
             RETURNING {PUPPY_COLUMNS}",
            state_predicate(transition.allowed_from())
        );
        let target = transition.target();
        let mut update = sqlx::query_as::<_, Puppy>(&query)
            .bind(puppy_id)
            .bind(target.puppy_status().as_str())
            .bind(target.deposit_status().as_str());
        if only_overdue {
            update = update.bind(actor.now);
        }
        let puppy = update.fetch_optional(&mut *tx).await?;
        let Some(puppy) = puppy else {
            return Err(rejection(&mut tx, puppy_id, transition).await);
        };

        let reservation =
            settle_latest_pending(&mut tx, puppy_id, reason.reservation_status()).await?;

        finish(
            tx,
            transition,
            LifecycleState::AwaitingDeposit,
            actor,
            puppy,
            reservation,
            true,
            notify,
        )
        .await
    }

    /// A customer cancels their own pending reservation.
    ///
    /// Allowed only while the reservation belongs to `user_id`, is still
    /// `pending` and its due date has not passed. The puppy is released in
    /// the same transaction if it is still awaiting the deposit.
    pub async fn cancel_by_customer<F>(
        pool: &PgPool,
        reservation_id: DbId,
        user_id: DbId,
        now: Timestamp,
        notify: F,
    ) -> Result<TransitionOutcome, TransitionError>
    where
        F: FnOnce(&Puppy, Option<&Reservation>) -> Vec<NewOutboxMessage>,
    {
        let transition = Transition::Release(ReleaseReason::CustomerCancelled);
        let mut tx = pool.begin().await?;

        let query = format!(
            "SELECT {RESERVATION_COLUMNS} FROM reservations WHERE id = $1 AND user_id = $2"
        );
        let existing = sqlx::query_as::<_, Reservation>(&query)
            .bind(reservation_id)
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(existing) = existing else {
            return Err(CoreError::NotFound {
                entity: "Reservation",
                id: reservation_id,
            }
            .into());
        };
        check_self_cancel(existing.status(), existing.deposit_due_at, now)?;

        // Lock the puppy before the reservation, matching the other
        // transitions.
        let target = transition.target();
        let query = format!(
            "UPDATE puppies SET
                status = $2,
                deposit_status = $3,
                deposit_due_at = NULL,
                deposit_reference = NULL,
                version = version + 1
             WHERE id = $1 AND ({})
             RETURNING {PUPPY_COLUMNS}",
            state_predicate(transition.allowed_from())
        );
        let released = sqlx::query_as::<_, Puppy>(&query)
            .bind(existing.puppy_id)
            .bind(target.puppy_status().as_str())
            .bind(target.deposit_status().as_str())
            .fetch_optional(&mut *tx)
            .await?;

        let query = format!(
            "UPDATE reservations SET status = $2
             WHERE id = $1 AND status = $3
             RETURNING {RESERVATION_COLUMNS}"
        );
        let reservation = sqlx::query_as::<_, Reservation>(&query)
            .bind(reservation_id)
            .bind(ReservationStatus::Cancelled.as_str())
            .bind(ReservationStatus::Pending.as_str())
            .fetch_optional(&mut *tx)
            .await?;
        let Some(reservation) = reservation else {
            return Err(CoreError::Conflict(
                "The reservation changed while it was being cancelled".into(),
            )
            .into());
        };

        let puppy_changed = released.is_some();
        let puppy = match released {
            Some(puppy) => puppy,
            None => {
                let query = format!("SELECT {PUPPY_COLUMNS} FROM puppies WHERE id = $1");
                sqlx::query_as::<_, Puppy>(&query)
                    .bind(existing.puppy_id)
                    .fetch_one(&mut *tx)
                    .await?
            }
        };

        let actor = Actor {
            user_id: Some(user_id),
            now,
        };
        finish(
            tx,
            transition,
            LifecycleState::AwaitingDeposit,
            actor,
            puppy,
            Some(reservation),
            puppy_changed,
            notify,
        )
        .await
    }

    /// `Available | Confirmed -> Sold`: the operator records the sale.
    ///
    /// The deposit reference is kept for bookkeeping; the due date is
    /// cleared.
    pub async fn mark_sold(
        pool: &PgPool,
        puppy_id: DbId,
        actor: Actor,
    ) -> Result<TransitionOutcome, TransitionError> {
        let transition = Transition::MarkSold;
        let target = transition.target();
        let mut tx = pool.begin().await?;

        // Capture the source state before the row is overwritten.
        let previous: Option<(String, String)> = sqlx::query_as(
            "SELECT status, deposit_status FROM puppies WHERE id = $1 FOR UPDATE",
        )
        .bind(puppy_id)
        .fetch_optional(&mut *tx)
        .await?;

        let query = format!(
            "UPDATE puppies SET
                status = $2,
                deposit_status = $3,
                deposit_due_at = NULL,
                version = version + 1
             WHERE id = $1 AND ({})
             RETURNING {PUPPY_COLUMNS}",
            state_predicate(transition.allowed_from())
        );
        let puppy = sqlx::query_as::<_, Puppy>(&query)
            .bind(puppy_id)
            .bind(target.puppy_status().as_str())
            .bind(target.deposit_status().as_str())
            .fetch_optional(&mut *tx)
            .await?;
        let Some(puppy) = puppy else {
            return Err(rejection(&mut tx, puppy_id, transition).await);
        };

        let from = match previous {
            Some((status, deposit)) => LifecycleState::parse(&status, &deposit)?,
            None => LifecycleState::Available,
        };
        finish(tx, transition, from, actor, puppy, None, true, |_, _| Vec::new()).await
    }

    /// IDs of puppies awaiting a deposit whose due date is before `now`.
    pub async fn list_expired_holds(
        pool: &PgPool,
        now: Timestamp,
    ) -> Result<Vec<DbId>, sqlx::Error> {
        let query = format!(
            "SELECT id FROM puppies
             WHERE ({}) AND deposit_due_at < $1
             ORDER BY deposit_due_at ASC",
            state_predicate(&[LifecycleState::AwaitingDeposit])
        );
        sqlx::query_scalar(&query).bind(now).fetch_all(pool).await
    }
}

/// SQL predicate matching rows in any of `states`.
///
/// Values come from the closed lifecycle enums, never from user input.
fn state_predicate(states: &[LifecycleState]) -> String {
    states
        .iter()
        .map(|s| {
            format!(
                "(status = '{}' AND deposit_status = '{}')",
                s.puppy_status().as_str(),
                s.deposit_status().as_str()
            )
        })
        .collect::<Vec<_>>()
        .join(" OR ")
}

/// Explain why a compare-and-swap matched no row.
async fn rejection(
    tx: &mut Transaction<'_, Postgres>,
    puppy_id: DbId,
    transition: Transition,
) -> TransitionError {
    let current: Result<Option<(String, String)>, sqlx::Error> =
        sqlx::query_as("SELECT status, deposit_status FROM puppies WHERE id = $1")
            .bind(puppy_id)
            .fetch_optional(&mut **tx)
            .await;

    match current {
        Err(e) => e.into(),
        Ok(None) => CoreError::NotFound {
            entity: "Puppy",
            id: puppy_id,
        }
        .into(),
        Ok(Some((status, deposit))) => {
            let outcome = LifecycleState::parse(&status, &deposit)
                .and_then(|state| transition.apply(state));
            match outcome {
                Err(e) => e.into(),
                // In an accepted state but the guard still failed (e.g. the
                // hold is not overdue yet).
                Ok(_) => CoreError::Conflict(format!(
                    "Puppy {puppy_id} no longer matches the expected state"
                ))
                .into(),
            }
        }
    }
}

/// Move the most recent pending reservation of a puppy to `status`.
async fn settle_latest_pending(
    tx: &mut Transaction<'_, Postgres>,
    puppy_id: DbId,
    status: ReservationStatus,
) -> Result<Option<Reservation>, sqlx::Error> {
    let query = format!(
        "UPDATE reservations SET status = $2
         WHERE id = (
             SELECT id FROM reservations
             WHERE puppy_id = $1 AND status = $3
             ORDER BY created_at DESC
             LIMIT 1
             FOR UPDATE
         )
         RETURNING {RESERVATION_COLUMNS}"
    );
    sqlx::query_as::<_, Reservation>(&query)
        .bind(puppy_id)
        .bind(status.as_str())
        .bind(ReservationStatus::Pending.as_str())
        .fetch_optional(&mut **tx)
        .await
}

/// Enqueue notifications, record the audit event and commit.
#[allow(clippy::too_many_arguments)]
async fn finish<F>(
    mut tx: Transaction<'_, Postgres>,
    transition: Transition,
    from: LifecycleState,
    actor: Actor,
    puppy: Puppy,
    reservation: Option<Reservation>,
    puppy_changed: bool,
    notify: F,
) -> Result<TransitionOutcome, TransitionError>
where
    F: FnOnce(&Puppy, Option<&Reservation>) -> Vec<NewOutboxMessage>,
{
    for msg in notify(&puppy, reservation.as_ref()) {
        NotificationRepo::enqueue(&mut *tx, &msg).await?;
    }

    let to = if puppy_changed {
        transition.target()
    } else {
        from
    };
    let mut payload = json!({
        "from": from,
        "to": to,
        "puppy_changed": puppy_changed,
        "deposit_reference": puppy.deposit_reference,
        "at": actor.now,
    });
    if let Transition::Release(reason) = transition {
        payload["reason"] = json!(reason);
    }
    if let Some(r) = &reservation {
        payload["reservation_id"] = json!(r.id);
        payload["reservation_status"] = json!(r.status);
    }
    EventRepo::insert(
        &mut *tx,
        transition.event_type(),
        Some(ENTITY_PUPPY),
        Some(puppy.id),
        actor.user_id,
        &payload,
    )
    .await?;

    tx.commit().await?;
    Ok(TransitionOutcome {
        transition,
        puppy,
        reservation,
        puppy_changed,
    })
}
