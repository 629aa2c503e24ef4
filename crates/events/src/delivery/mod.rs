//! Email transports.
//!
//! Two independent transports implement [`Mailer`]: an SMTP relay
//! ([`smtp::SmtpMailer`]) and an HTTP email-sending service
//! ([`email_service::EmailServiceMailer`]). Either may be unconfigured.

pub mod email_service;
pub mod smtp;

use async_trait::async_trait;

/// Error type for email delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    /// SMTP transport-level failure (authentication, connection, etc.).
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    /// The recipient or sender address could not be parsed.
    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// The MIME message could not be assembled.
    #[error("Email build error: {0}")]
    Build(String),

    /// The HTTP request to the email service failed.
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The email service answered with a non-2xx status.
    #[error("Email service returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },
}

/// A fully composed email.
#[derive(Debug, Clone)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub html_body: String,
    /// Variables for template-based transports. SMTP ignores them.
    pub template_params: serde_json::Value,
    pub reply_to: Option<String>,
}

/// A transport able to deliver an [`OutgoingEmail`].
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    async fn send(&self, email: &OutgoingEmail) -> Result<(), EmailError>;
}
