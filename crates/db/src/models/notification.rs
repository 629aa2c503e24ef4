//! Notification outbox model.
//!
//! Emails are not sent inline. Lifecycle transactions insert outbox rows
//! and the dispatcher delivers them after commit, retrying on failure.

use goldipuppy_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// Outbox row status values.
pub const OUTBOX_QUEUED: &str = "queued";
pub const OUTBOX_SENT: &str = "sent";
pub const OUTBOX_FAILED: &str = "failed";

/// Transport a message is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationTransport {
    /// HTTP email-sending service (template based).
    EmailService,
    /// SMTP relay.
    Smtp,
}

impl NotificationTransport {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::EmailService => "email_service",
            Self::Smtp => "smtp",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "email_service" => Some(Self::EmailService),
            "smtp" => Some(Self::Smtp),
            _ => None,
        }
    }
}

/// A row from the `notification_outbox` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct OutboxMessage {
    pub id: DbId,
    pub dedupe_key: String,
    pub transport: String,
    pub recipient: String,
    pub subject: String,
    pub html_body: String,
    pub template_params: serde_json::Value,
    pub status: String,
    pub attempts: i32,
    pub next_attempt_at: Timestamp,
    pub last_error: Option<String>,
    pub created_at: Timestamp,
    pub sent_at: Option<Timestamp>,
}

/// A message to enqueue.
///
/// `dedupe_key` identifies the logical notification; enqueueing the same
/// key twice is a no-op.
#[derive(Debug, Clone)]
pub struct NewOutboxMessage {
    pub dedupe_key: String,
    pub transport: NotificationTransport,
    pub recipient: String,
    pub subject: String,
    pub html_body: String,
    pub template_params: serde_json::Value,
}
