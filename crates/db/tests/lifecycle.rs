//! Integration tests for the reservation/deposit lifecycle.
//!
//! Every test checks that the puppy row stays consistent: a deposit is
//! tracked exactly while the puppy is reserved.

use assert_matches::assert_matches;
use chrono::{Duration, Utc};
use goldipuppy_core::contact::CustomerContact;
use goldipuppy_core::error::CoreError;
use goldipuppy_core::lifecycle::{invariant_holds, LifecycleState, ReleaseReason};
use goldipuppy_core::roles::ROLE_CUSTOMER;
use goldipuppy_core::types::DbId;
use goldipuppy_db::models::notification::{NewOutboxMessage, NotificationTransport};
use goldipuppy_db::models::puppy::{CreatePuppy, Puppy};
use goldipuppy_db::models::reservation::Reservation;
use goldipuppy_db::models::user::CreateUser;
use goldipuppy_db::repositories::lifecycle_repo::Actor;
use goldipuppy_db::repositories::{
    EventRepo, LifecycleRepo, NotificationRepo, PuppyRepo, ReservationRepo, TransitionError,
    UserRepo,
};
use rust_decimal::Decimal;
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn new_user(pool: &PgPool, email: &str) -> DbId {
    UserRepo::create(
        pool,
        &CreateUser {
            email: email.to_string(),
            full_name: "Test Customer".to_string(),
            password_hash: "not-a-real-hash".to_string(),
            role: ROLE_CUSTOMER.to_string(),
        },
    )
    .await
    .unwrap()
    .id
}

async fn new_puppy(pool: &PgPool, name: &str) -> DbId {
    let input = CreatePuppy {
        name: name.to_string(),
        breed: "Golden Retriever".to_string(),
        breed_slug: Some("golden-retriever".to_string()),
        price: Decimal::from(1500),
        currency: None,
        gender: Some("Male".to_string()),
        age: Some("8 weeks".to_string()),
        size: None,
        location: None,
        description: None,
        image: None,
        images: None,
        featured: None,
    };
    PuppyRepo::create(pool, &input, "EUR", Utc::now())
        .await
        .unwrap()
        .puppy
        .id
}

fn contact() -> CustomerContact {
    CustomerContact {
        customer_name: "Ada Lovelace".to_string(),
        customer_email: "ada@example.com".to_string(),
        customer_phone: None,
        message: Some("Can't wait!".to_string()),
    }
}

fn no_mail(_: &Puppy, _: Option<&Reservation>) -> Vec<NewOutboxMessage> {
    Vec::new()
}

fn admin(now: chrono::DateTime<Utc>) -> Actor {
    Actor { user_id: None, now }
}

async fn assert_consistent(pool: &PgPool, puppy_id: DbId) -> Puppy {
    let puppy = PuppyRepo::find_row(pool, puppy_id).await.unwrap().unwrap();
    assert!(
        invariant_holds(&puppy.status, &puppy.deposit_status),
        "inconsistent row: status={}, deposit_status={}",
        puppy.status,
        puppy.deposit_status
    );
    puppy
}

// ---------------------------------------------------------------------------
// Reserve
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_reserve_sets_hold_and_reservation(pool: PgPool) {
    let user = new_user(&pool, "ada@example.com").await;
    let puppy_id = new_puppy(&pool, "Max").await;
    let now = Utc::now();

    let outcome = LifecycleRepo::reserve(&pool, puppy_id, user, &contact(), 2, now, no_mail)
        .await
        .unwrap();

    let expected_ref = format!(
        "GOLDIPUPPY-{}",
        puppy_id.to_string()[..8].to_uppercase()
    );
    assert_eq!(outcome.puppy.lifecycle_state().unwrap(), LifecycleState::AwaitingDeposit);
    assert_eq!(outcome.puppy.deposit_reference.as_deref(), Some(expected_ref.as_str()));

    let reservation = outcome.reservation.unwrap();
    assert_eq!(reservation.status, "pending");
    assert_eq!(reservation.user_id, user);
    assert_eq!(reservation.deposit_reference, expected_ref);
    assert_eq!(
        (reservation.deposit_due_at - reservation.created_at).num_milliseconds(),
        172_800_000
    );
    assert_eq!(Some(reservation.deposit_due_at), outcome.puppy.deposit_due_at);

    assert_consistent(&pool, puppy_id).await;
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_reserve_twice_conflicts(pool: PgPool) {
    let user = new_user(&pool, "ada@example.com").await;
    let puppy_id = new_puppy(&pool, "Max").await;
    let now = Utc::now();

    LifecycleRepo::reserve(&pool, puppy_id, user, &contact(), 2, now, no_mail)
        .await
        .unwrap();
    let second = LifecycleRepo::reserve(&pool, puppy_id, user, &contact(), 2, now, no_mail).await;
    assert_matches!(second, Err(TransitionError::Core(CoreError::Conflict(_))));

    let reservations = ReservationRepo::list_for_puppy(&pool, puppy_id).await.unwrap();
    assert_eq!(reservations.len(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_concurrent_reserve_exactly_one_wins(pool: PgPool) {
    let alice = new_user(&pool, "alice@example.com").await;
    let bob = new_user(&pool, "bob@example.com").await;
    let puppy_id = new_puppy(&pool, "Bella").await;
    let now = Utc::now();
    let contact = contact();

    let (a, b) = tokio::join!(
        LifecycleRepo::reserve(&pool, puppy_id, alice, &contact, 2, now, no_mail),
        LifecycleRepo::reserve(&pool, puppy_id, bob, &contact, 2, now, no_mail),
    );

    let wins = [a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count();
    assert_eq!(wins, 1);
    let loser = if a.is_ok() { b } else { a };
    assert_matches!(loser, Err(TransitionError::Core(CoreError::Conflict(_))));
    assert_consistent(&pool, puppy_id).await;
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_reserve_unknown_puppy_not_found(pool: PgPool) {
    let user = new_user(&pool, "ada@example.com").await;
    let result = LifecycleRepo::reserve(
        &pool,
        DbId::new_v4(),
        user,
        &contact(),
        2,
        Utc::now(),
        no_mail,
    )
    .await;
    assert_matches!(result, Err(TransitionError::Core(CoreError::NotFound { .. })));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_reserve_enqueues_notifications_once(pool: PgPool) {
    let user = new_user(&pool, "ada@example.com").await;
    let puppy_id = new_puppy(&pool, "Max").await;

    let outcome = LifecycleRepo::reserve(
        &pool,
        puppy_id,
        user,
        &contact(),
        2,
        Utc::now(),
        |_, reservation| {
            let id = reservation.map(|r| r.id).unwrap_or_default();
            vec![NewOutboxMessage {
                dedupe_key: format!("reservation:{id}:operator_alert"),
                transport: NotificationTransport::Smtp,
                recipient: "operator@example.com".to_string(),
                subject: "New reservation".to_string(),
                html_body: "<p>New reservation</p>".to_string(),
                template_params: serde_json::json!({}),
            }]
        },
    )
    .await
    .unwrap();

    let key = format!("reservation:{}:operator_alert", outcome.reservation.unwrap().id);
    let queued = NotificationRepo::find_by_dedupe_key(&pool, &key).await.unwrap().unwrap();
    assert_eq!(queued.status, "queued");

    // Enqueueing the same logical message again is a no-op.
    let again = NewOutboxMessage {
        dedupe_key: key.clone(),
        transport: NotificationTransport::Smtp,
        recipient: "operator@example.com".to_string(),
        subject: "Duplicate".to_string(),
        html_body: String::new(),
        template_params: serde_json::json!({}),
    };
    assert!(!NotificationRepo::enqueue(&pool, &again).await.unwrap());

    let events = EventRepo::list_for_entity(&pool, "puppy", puppy_id).await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, "puppy.reserved");
    assert_eq!(events[0].actor_user_id, Some(user));
}

// ---------------------------------------------------------------------------
// Confirm deposit
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_confirm_deposit_marks_latest_pending_paid(pool: PgPool) {
    let user = new_user(&pool, "ada@example.com").await;
    let puppy_id = new_puppy(&pool, "Max").await;
    let now = Utc::now();

    // An earlier hold that was released, then a new one.
    let earlier = now - Duration::hours(1);
    LifecycleRepo::reserve(&pool, puppy_id, user, &contact(), 2, earlier, no_mail)
        .await
        .unwrap();
    LifecycleRepo::release(&pool, puppy_id, ReleaseReason::Cancelled, admin(now), no_mail)
        .await
        .unwrap();
    let current = LifecycleRepo::reserve(&pool, puppy_id, user, &contact(), 2, now, no_mail)
        .await
        .unwrap()
        .reservation
        .unwrap();

    let outcome = LifecycleRepo::confirm_deposit(&pool, puppy_id, admin(now), no_mail)
        .await
        .unwrap();
    assert_eq!(outcome.puppy.lifecycle_state().unwrap(), LifecycleState::Confirmed);
    let paid = outcome.reservation.unwrap();
    assert_eq!(paid.id, current.id);
    assert_eq!(paid.status, "paid");

    let statuses: Vec<String> = ReservationRepo::list_for_puppy(&pool, puppy_id)
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.status)
        .collect();
    assert_eq!(statuses, ["paid", "cancelled"]);
    assert_consistent(&pool, puppy_id).await;
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_confirm_deposit_without_reservation_still_transitions(pool: PgPool) {
    let puppy_id = new_puppy(&pool, "Max").await;
    let due = Utc::now() + Duration::days(2);

    // Hold placed outside the reservation flow (e.g. by hand).
    sqlx::query(
        "UPDATE puppies SET status = 'reserved', deposit_status = 'pending',
            deposit_due_at = $2, deposit_reference = 'GOLDIPUPPY-MANUAL1'
         WHERE id = $1",
    )
    .bind(puppy_id)
    .bind(due)
    .execute(&pool)
    .await
    .unwrap();

    let outcome = LifecycleRepo::confirm_deposit(&pool, puppy_id, admin(Utc::now()), no_mail)
        .await
        .unwrap();
    assert!(outcome.reservation.is_none());
    assert_eq!(outcome.puppy.status, "reserved");
    assert_eq!(outcome.puppy.deposit_status, "paid");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_confirm_deposit_requires_pending(pool: PgPool) {
    let puppy_id = new_puppy(&pool, "Max").await;
    let result = LifecycleRepo::confirm_deposit(&pool, puppy_id, admin(Utc::now()), no_mail).await;
    assert_matches!(result, Err(TransitionError::Core(CoreError::Conflict(_))));
}

// ---------------------------------------------------------------------------
// Release / self-cancel / sweep
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_release_expired_resets_puppy(pool: PgPool) {
    let user = new_user(&pool, "ada@example.com").await;
    let puppy_id = new_puppy(&pool, "Max").await;
    let now = Utc::now();
    LifecycleRepo::reserve(&pool, puppy_id, user, &contact(), 2, now, no_mail)
        .await
        .unwrap();

    let outcome =
        LifecycleRepo::release(&pool, puppy_id, ReleaseReason::Expired, admin(now), no_mail)
            .await
            .unwrap();
    assert_eq!(outcome.reservation.unwrap().status, "expired");

    let puppy = assert_consistent(&pool, puppy_id).await;
    assert_eq!(puppy.status, "available");
    assert_eq!(puppy.deposit_status, "none");
    assert!(puppy.deposit_due_at.is_none());
    assert!(puppy.deposit_reference.is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_self_cancel_before_due_date(pool: PgPool) {
    let user = new_user(&pool, "ada@example.com").await;
    let puppy_id = new_puppy(&pool, "Max").await;
    let now = Utc::now();
    let reservation = LifecycleRepo::reserve(&pool, puppy_id, user, &contact(), 2, now, no_mail)
        .await
        .unwrap()
        .reservation
        .unwrap();

    let outcome = LifecycleRepo::cancel_by_customer(
        &pool,
        reservation.id,
        user,
        now + Duration::hours(1),
        no_mail,
    )
    .await
    .unwrap();
    assert!(outcome.puppy_changed);
    assert_eq!(outcome.reservation.unwrap().status, "cancelled");

    let puppy = assert_consistent(&pool, puppy_id).await;
    assert_eq!(puppy.status, "available");
    assert_eq!(puppy.deposit_status, "none");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_self_cancel_after_due_date_rejected(pool: PgPool) {
    let user = new_user(&pool, "ada@example.com").await;
    let puppy_id = new_puppy(&pool, "Max").await;
    let now = Utc::now();
    let reservation = LifecycleRepo::reserve(&pool, puppy_id, user, &contact(), 2, now, no_mail)
        .await
        .unwrap()
        .reservation
        .unwrap();

    let late = reservation.deposit_due_at + Duration::milliseconds(1);
    let result = LifecycleRepo::cancel_by_customer(&pool, reservation.id, user, late, no_mail).await;
    assert_matches!(result, Err(TransitionError::Core(CoreError::Conflict(_))));

    let puppy = assert_consistent(&pool, puppy_id).await;
    assert_eq!(puppy.deposit_status, "pending");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_self_cancel_other_users_reservation_not_found(pool: PgPool) {
    let owner = new_user(&pool, "ada@example.com").await;
    let stranger = new_user(&pool, "eve@example.com").await;
    let puppy_id = new_puppy(&pool, "Max").await;
    let now = Utc::now();
    let reservation = LifecycleRepo::reserve(&pool, puppy_id, owner, &contact(), 2, now, no_mail)
        .await
        .unwrap()
        .reservation
        .unwrap();

    let result =
        LifecycleRepo::cancel_by_customer(&pool, reservation.id, stranger, now, no_mail).await;
    assert_matches!(result, Err(TransitionError::Core(CoreError::NotFound { .. })));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_sweep_releases_only_overdue_holds(pool: PgPool) {
    let user = new_user(&pool, "ada@example.com").await;
    let overdue = new_puppy(&pool, "Max").await;
    let fresh = new_puppy(&pool, "Bella").await;
    let now = Utc::now();

    LifecycleRepo::reserve(&pool, overdue, user, &contact(), 2, now - Duration::days(3), no_mail)
        .await
        .unwrap();
    LifecycleRepo::reserve(&pool, fresh, user, &contact(), 2, now, no_mail)
        .await
        .unwrap();

    let expired = LifecycleRepo::list_expired_holds(&pool, now).await.unwrap();
    assert_eq!(expired, vec![overdue]);

    LifecycleRepo::release_expired(&pool, overdue, now, no_mail)
        .await
        .unwrap();
    // Not overdue yet: the guard refuses.
    let result = LifecycleRepo::release_expired(&pool, fresh, now, no_mail).await;
    assert_matches!(result, Err(TransitionError::Core(CoreError::Conflict(_))));

    assert_eq!(assert_consistent(&pool, overdue).await.status, "available");
    assert_eq!(assert_consistent(&pool, fresh).await.status, "reserved");
    let history = ReservationRepo::list_for_puppy(&pool, overdue).await.unwrap();
    assert_eq!(history[0].status, "expired");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_reserve_after_release_repeats_reference(pool: PgPool) {
    let alice = new_user(&pool, "alice@example.com").await;
    let bob = new_user(&pool, "bob@example.com").await;
    let puppy_id = new_puppy(&pool, "Max").await;
    let now = Utc::now();

    let per_reservation = |_: &Puppy, reservation: Option<&Reservation>| -> Vec<NewOutboxMessage> {
        let id = reservation.map(|r| r.id).unwrap_or_default();
        ["operator_alert", "customer_confirmation"]
            .into_iter()
            .map(|kind| NewOutboxMessage {
                dedupe_key: format!("reservation:{id}:{kind}"),
                transport: NotificationTransport::Smtp,
                recipient: "someone@example.com".to_string(),
                subject: kind.to_string(),
                html_body: String::new(),
                template_params: serde_json::json!({}),
            })
            .collect()
    };

    let first = LifecycleRepo::reserve(&pool, puppy_id, alice, &contact(), 2, now, per_reservation)
        .await
        .unwrap()
        .reservation
        .unwrap();
    LifecycleRepo::release(&pool, puppy_id, ReleaseReason::Cancelled, admin(now), no_mail)
        .await
        .unwrap();
    let second = LifecycleRepo::reserve(&pool, puppy_id, bob, &contact(), 2, now, per_reservation)
        .await
        .unwrap()
        .reservation
        .unwrap();

    assert_eq!(first.deposit_reference, second.deposit_reference);
    assert_ne!(first.id, second.id);

    let queued: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM notification_outbox WHERE dedupe_key LIKE 'reservation:%'",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(queued, 4);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_delete_puppy_keeps_reservation_history(pool: PgPool) {
    let user = new_user(&pool, "ada@example.com").await;
    let paid_puppy = new_puppy(&pool, "Max").await;
    let held_puppy = new_puppy(&pool, "Bella").await;
    let now = Utc::now();

    let paid = LifecycleRepo::reserve(&pool, paid_puppy, user, &contact(), 2, now, no_mail)
        .await
        .unwrap()
        .reservation
        .unwrap();
    LifecycleRepo::confirm_deposit(&pool, paid_puppy, admin(now), no_mail)
        .await
        .unwrap();
    let held = LifecycleRepo::reserve(&pool, held_puppy, user, &contact(), 2, now, no_mail)
        .await
        .unwrap()
        .reservation
        .unwrap();

    assert!(PuppyRepo::delete(&pool, paid_puppy).await.unwrap().is_some());
    assert!(PuppyRepo::delete(&pool, held_puppy).await.unwrap().is_some());

    let paid = ReservationRepo::find_by_id(&pool, paid.id).await.unwrap().unwrap();
    assert_eq!(paid.status, "paid");
    assert_eq!(paid.puppy_id, paid_puppy);
    // An open hold on a deleted listing is closed.
    let held = ReservationRepo::find_by_id(&pool, held.id).await.unwrap().unwrap();
    assert_eq!(held.status, "cancelled");

    let mine = ReservationRepo::list_for_user(&pool, user).await.unwrap();
    assert_eq!(mine.len(), 2);
    assert!(mine.iter().all(|r| r.puppy_name.is_none()));
}

// ---------------------------------------------------------------------------
// Mark sold
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_mark_sold_from_confirmed_keeps_reference(pool: PgPool) {
    let user = new_user(&pool, "ada@example.com").await;
    let puppy_id = new_puppy(&pool, "Max").await;
    let now = Utc::now();
    LifecycleRepo::reserve(&pool, puppy_id, user, &contact(), 2, now, no_mail)
        .await
        .unwrap();
    LifecycleRepo::confirm_deposit(&pool, puppy_id, admin(now), no_mail)
        .await
        .unwrap();

    let outcome = LifecycleRepo::mark_sold(&pool, puppy_id, admin(now)).await.unwrap();
    assert_eq!(outcome.puppy.lifecycle_state().unwrap(), LifecycleState::Sold);
    assert!(outcome.puppy.deposit_reference.is_some());
    assert!(outcome.puppy.deposit_due_at.is_none());
    assert_consistent(&pool, puppy_id).await;
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_mark_sold_rejected_while_awaiting_deposit(pool: PgPool) {
    let user = new_user(&pool, "ada@example.com").await;
    let puppy_id = new_puppy(&pool, "Max").await;
    let now = Utc::now();
    LifecycleRepo::reserve(&pool, puppy_id, user, &contact(), 2, now, no_mail)
        .await
        .unwrap();

    let result = LifecycleRepo::mark_sold(&pool, puppy_id, admin(now)).await;
    assert_matches!(result, Err(TransitionError::Core(CoreError::Conflict(_))));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_inconsistent_row_rejected_by_constraint(pool: PgPool) {
    let puppy_id = new_puppy(&pool, "Max").await;
    let result = sqlx::query("UPDATE puppies SET deposit_status = 'pending' WHERE id = $1")
        .bind(puppy_id)
        .execute(&pool)
        .await;
    assert!(result.is_err());
}
