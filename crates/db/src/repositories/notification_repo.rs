//! Repository for the `notification_outbox` table.

use chrono::Duration;
use goldipuppy_core::types::{DbId, Timestamp};
use sqlx::{PgExecutor, PgPool};

use crate::models::notification::{
    NewOutboxMessage, OutboxMessage, OUTBOX_FAILED, OUTBOX_QUEUED, OUTBOX_SENT,
};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, dedupe_key, transport, recipient, subject, html_body, \
                        template_params, status, attempts, next_attempt_at, last_error, \
                        created_at, sent_at";

/// How long a claimed row is hidden from other dispatchers while it is
/// being delivered.
const CLAIM_LEASE_SECS: i64 = 300;

/// Provides enqueue, claim and completion operations for the outbox.
pub struct NotificationRepo;

impl NotificationRepo {
    /// Enqueue a message. Returns `false` when a message with the same
    /// `dedupe_key` already exists.
    pub async fn enqueue<'e, E: PgExecutor<'e>>(
        executor: E,
        msg: &NewOutboxMessage,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO notification_outbox
                (dedupe_key, transport, recipient, subject, html_body, template_params)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT (dedupe_key) DO NOTHING",
        )
        .bind(&msg.dedupe_key)
        .bind(msg.transport.as_str())
        .bind(&msg.recipient)
        .bind(&msg.subject)
        .bind(&msg.html_body)
        .bind(&msg.template_params)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Claim up to `limit` due messages.
    ///
    /// Uses `SELECT FOR UPDATE SKIP LOCKED` so concurrent dispatchers never
    /// claim the same row, and pushes `next_attempt_at` forward by a lease
    /// so a crashed dispatcher's claims become due again later.
    pub async fn claim_due(
        pool: &PgPool,
        limit: i64,
        now: Timestamp,
    ) -> Result<Vec<OutboxMessage>, sqlx::Error> {
        let query = format!(
            "UPDATE notification_outbox
             SET next_attempt_at = $2
             WHERE id IN (
                 SELECT id FROM notification_outbox
                 WHERE status = $3 AND next_attempt_at <= $1
                 ORDER BY next_attempt_at ASC
                 LIMIT $4
                 FOR UPDATE SKIP LOCKED
             )
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, OutboxMessage>(&query)
            .bind(now)
            .bind(now + Duration::seconds(CLAIM_LEASE_SECS))
            .bind(OUTBOX_QUEUED)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Mark a message delivered.
    pub async fn mark_sent(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE notification_outbox
             SET status = $2, sent_at = NOW(), attempts = attempts + 1, last_error = NULL
             WHERE id = $1",
        )
        .bind(id)
        .bind(OUTBOX_SENT)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Record a failed attempt and schedule the next one.
    pub async fn schedule_retry(
        pool: &PgPool,
        id: DbId,
        error: &str,
        next_attempt_at: Timestamp,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE notification_outbox
             SET attempts = attempts + 1, last_error = $2, next_attempt_at = $3
             WHERE id = $1",
        )
        .bind(id)
        .bind(error)
        .bind(next_attempt_at)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Record a final failed attempt; the message will not be retried.
    pub async fn mark_failed(pool: &PgPool, id: DbId, error: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE notification_outbox
             SET status = $3, attempts = attempts + 1, last_error = $2
             WHERE id = $1",
        )
        .bind(id)
        .bind(error)
        .bind(OUTBOX_FAILED)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Find a message by its dedupe key.
    pub async fn find_by_dedupe_key(
        pool: &PgPool,
        dedupe_key: &str,
    ) -> Result<Option<OutboxMessage>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM notification_outbox WHERE dedupe_key = $1");
        sqlx::query_as::<_, OutboxMessage>(&query)
            .bind(dedupe_key)
            .fetch_optional(pool)
            .await
    }
}
