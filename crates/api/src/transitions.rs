//! Shared plumbing for committed lifecycle transitions: the response body
//! handed back to callers and the bus event published after commit.

use goldipuppy_core::types::{DbId, Timestamp};
use goldipuppy_db::models::puppy::PuppyWithImages;
use goldipuppy_db::models::reservation::Reservation;
use goldipuppy_db::repositories::{PuppyRepo, TransitionOutcome};
use goldipuppy_db::DbPool;
use goldipuppy_events::{EventBus, PlatformEvent};
use serde::Serialize;
use serde_json::json;

/// Body returned by every transition endpoint.
#[derive(Debug, Serialize)]
pub struct TransitionResponse {
    pub puppy: PuppyWithImages,
    /// The reservation the transition touched; `null` when there was none.
    pub reservation: Option<Reservation>,
}

impl TransitionResponse {
    /// Build the response, re-reading the listing so `images` and the
    /// deposit countdown are filled in.
    pub async fn load(
        pool: &DbPool,
        outcome: TransitionOutcome,
        now: Timestamp,
    ) -> Result<Self, sqlx::Error> {
        let puppy = match PuppyRepo::find_by_id(pool, outcome.puppy.id, now).await? {
            Some(puppy) => puppy,
            // Deleted between commit and re-read; report the committed row.
            None => PuppyWithImages::new(outcome.puppy, Vec::new(), now),
        };
        Ok(Self {
            puppy,
            reservation: outcome.reservation,
        })
    }
}

/// Publish a committed transition on the in-process bus.
pub fn publish_transition(bus: &EventBus, outcome: &TransitionOutcome, actor: Option<DbId>) {
    let puppy = &outcome.puppy;
    let event = PlatformEvent::new(outcome.transition.event_type())
        .with_source("puppy", puppy.id)
        .with_actor(actor)
        .with_payload(json!({
            "status": puppy.status,
            "deposit_status": puppy.deposit_status,
            "deposit_reference": puppy.deposit_reference,
            "puppy_changed": outcome.puppy_changed,
            "reservation_id": outcome.reservation.as_ref().map(|r| r.id),
        }));
    bus.publish(event);
}
