//! Periodic release of holds whose deposit was never paid.
//!
//! Every tick the job lists puppies still awaiting a deposit past their
//! due date and releases each one as `expired`. Each release is its own
//! compare-and-swap transaction, so a hold confirmed by an admin between
//! the listing and the release is left alone.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use goldipuppy_core::error::CoreError;
use goldipuppy_core::lifecycle::ReleaseReason;
use goldipuppy_core::types::Timestamp;
use goldipuppy_db::repositories::{LifecycleRepo, TransitionError};
use goldipuppy_db::DbPool;
use goldipuppy_events::EventBus;
use tokio_util::sync::CancellationToken;

use crate::config::StoreConfig;
use crate::notifications::release_messages;
use crate::transitions::publish_transition;

/// Run the expiry sweep until `cancel` is triggered.
///
/// An `interval` of zero disables the job.
pub async fn run(
    pool: DbPool,
    event_bus: Arc<EventBus>,
    store: StoreConfig,
    interval: Duration,
    cancel: CancellationToken,
) {
    if interval.is_zero() {
        tracing::info!("Deposit expiry sweep disabled");
        return;
    }

    tracing::info!(interval_secs = interval.as_secs(), "Deposit expiry sweep started");
    let mut ticker = tokio::time::interval(interval);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Deposit expiry sweep stopping");
                break;
            }
            _ = ticker.tick() => {
                match sweep_once(&pool, &event_bus, &store, Utc::now()).await {
                    Ok(0) => tracing::debug!("Deposit expiry sweep: nothing overdue"),
                    Ok(released) => {
                        tracing::info!(released, "Deposit expiry sweep: released overdue holds");
                    }
                    Err(e) => tracing::error!(error = %e, "Deposit expiry sweep failed"),
                }
            }
        }
    }
}

/// Release every hold overdue at `now`. Returns how many were released.
///
/// A hold that changed state concurrently is skipped. Other per-puppy
/// failures are logged and do not stop the pass.
pub async fn sweep_once(
    pool: &DbPool,
    event_bus: &EventBus,
    store: &StoreConfig,
    now: Timestamp,
) -> Result<usize, sqlx::Error> {
    let overdue = LifecycleRepo::list_expired_holds(pool, now).await?;
    let mut released = 0;

    for puppy_id in overdue {
        let result = LifecycleRepo::release_expired(pool, puppy_id, now, |puppy, reservation| {
            release_messages(store, ReleaseReason::Expired, puppy, reservation)
        })
        .await;

        match result {
            Ok(outcome) => {
                tracing::info!(
                    puppy_id = %puppy_id,
                    reservation_id = ?outcome.reservation.as_ref().map(|r| r.id),
                    "Deposit hold expired"
                );
                publish_transition(event_bus, &outcome, None);
                released += 1;
            }
            Err(TransitionError::Core(CoreError::Conflict(reason))) => {
                tracing::debug!(puppy_id = %puppy_id, %reason, "Hold no longer overdue, skipped");
            }
            Err(e) => {
                tracing::error!(puppy_id = %puppy_id, error = %e, "Failed to expire hold");
            }
        }
    }

    Ok(released)
}
