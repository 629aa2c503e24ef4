//! Outbox dispatcher.
//!
//! Lifecycle transitions enqueue notification rows inside their
//! transaction; [`OutboxDispatcher`] delivers them after commit. Due rows
//! are claimed with `FOR UPDATE SKIP LOCKED`, sent through the transport
//! the row names (falling back to whichever is configured) and either
//! marked `sent` or rescheduled with exponential backoff. After
//! [`MAX_ATTEMPTS`] failures a row is marked `failed`.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use goldipuppy_core::types::Timestamp;
use goldipuppy_db::models::notification::{NotificationTransport, OutboxMessage};
use goldipuppy_db::repositories::NotificationRepo;
use goldipuppy_db::DbPool;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::bus::PlatformEvent;
use crate::delivery::{Mailer, OutgoingEmail};

/// Attempts after which a message is given up on.
pub const MAX_ATTEMPTS: i32 = 5;

/// Base delay of the retry schedule.
const BASE_RETRY_DELAY_SECS: i64 = 30;

/// Rows claimed per pass.
const BATCH_SIZE: i64 = 20;

/// Delay before the next attempt of a message that has failed
/// `attempts` times before: `30 s * 2^attempts`.
pub fn retry_delay(attempts: i32) -> chrono::Duration {
    let exp = attempts.clamp(0, 16) as u32;
    chrono::Duration::seconds(BASE_RETRY_DELAY_SECS * 2_i64.pow(exp))
}

/// Counts from one dispatch pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchStats {
    pub sent: usize,
    pub retried: usize,
    pub failed: usize,
}

/// Background service delivering queued notifications.
pub struct OutboxDispatcher {
    pool: DbPool,
    smtp: Option<Arc<dyn Mailer>>,
    email_service: Option<Arc<dyn Mailer>>,
    poll_interval: Duration,
}

impl OutboxDispatcher {
    pub fn new(
        pool: DbPool,
        smtp: Option<Arc<dyn Mailer>>,
        email_service: Option<Arc<dyn Mailer>>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            pool,
            smtp,
            email_service,
            poll_interval,
        }
    }

    /// Run the dispatch loop until `cancel` is triggered.
    ///
    /// Wakes on every poll tick and whenever an event is published on the
    /// bus, since a committed transition may just have queued emails.
    pub async fn run(
        self,
        mut events: broadcast::Receiver<PlatformEvent>,
        cancel: CancellationToken,
    ) {
        if self.smtp.is_none() && self.email_service.is_none() {
            tracing::warn!("No email transport configured, notifications stay queued");
        }
        tracing::info!(
            interval_secs = self.poll_interval.as_secs(),
            "Outbox dispatcher started"
        );

        let mut interval = tokio::time::interval(self.poll_interval);
        let mut bus_open = true;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Outbox dispatcher stopping");
                    break;
                }
                _ = interval.tick() => {}
                received = events.recv(), if bus_open => {
                    match received {
                        Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {}
                        Err(broadcast::error::RecvError::Closed) => {
                            bus_open = false;
                            continue;
                        }
                    }
                }
            }

            match self.dispatch_once(Utc::now()).await {
                Ok(stats) if stats != DispatchStats::default() => {
                    tracing::info!(
                        sent = stats.sent,
                        retried = stats.retried,
                        failed = stats.failed,
                        "Outbox dispatch pass complete"
                    );
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = %e, "Outbox dispatch failed"),
            }
        }
    }

    /// Claim and deliver every message due at `now`.
    pub async fn dispatch_once(&self, now: Timestamp) -> Result<DispatchStats, sqlx::Error> {
        let mut stats = DispatchStats::default();
        if self.smtp.is_none() && self.email_service.is_none() {
            return Ok(stats);
        }

        let batch = NotificationRepo::claim_due(&self.pool, BATCH_SIZE, now).await?;
        for msg in batch {
            let Some(mailer) = self.mailer_for(&msg.transport) else {
                continue;
            };

            match mailer.send(&to_email(&msg)).await {
                Ok(()) => {
                    NotificationRepo::mark_sent(&self.pool, msg.id).await?;
                    stats.sent += 1;
                }
                Err(e) => {
                    let error = e.to_string();
                    if msg.attempts + 1 >= MAX_ATTEMPTS {
                        tracing::error!(
                            outbox_id = %msg.id,
                            dedupe_key = %msg.dedupe_key,
                            transport = mailer.name(),
                            error = %error,
                            "Notification failed permanently"
                        );
                        NotificationRepo::mark_failed(&self.pool, msg.id, &error).await?;
                        stats.failed += 1;
                    } else {
                        let next = now + retry_delay(msg.attempts);
                        tracing::warn!(
                            outbox_id = %msg.id,
                            attempt = msg.attempts + 1,
                            transport = mailer.name(),
                            error = %error,
                            "Notification delivery failed, will retry"
                        );
                        NotificationRepo::schedule_retry(&self.pool, msg.id, &error, next).await?;
                        stats.retried += 1;
                    }
                }
            }
        }
        Ok(stats)
    }

    /// Transport named by the row, or the other one if it is not configured.
    fn mailer_for(&self, transport: &str) -> Option<&Arc<dyn Mailer>> {
        let (preferred, fallback) = match NotificationTransport::parse(transport) {
            Some(NotificationTransport::EmailService) => (&self.email_service, &self.smtp),
            _ => (&self.smtp, &self.email_service),
        };
        preferred.as_ref().or(fallback.as_ref())
    }
}

fn to_email(msg: &OutboxMessage) -> OutgoingEmail {
    OutgoingEmail {
        to: msg.recipient.clone(),
        subject: msg.subject.clone(),
        html_body: msg.html_body.clone(),
        template_params: msg.template_params.clone(),
        reply_to: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_delay_doubles() {
        assert_eq!(retry_delay(0), chrono::Duration::seconds(30));
        assert_eq!(retry_delay(1), chrono::Duration::seconds(60));
        assert_eq!(retry_delay(4), chrono::Duration::seconds(480));
    }

    #[test]
    fn retry_delay_clamps_negative_attempts() {
        assert_eq!(retry_delay(-3), chrono::Duration::seconds(30));
    }
}
