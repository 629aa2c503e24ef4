//! HTTP email-service transport.
//!
//! Sends template-based emails by POSTing JSON to a hosted email-sending
//! API. The service renders its own template from `template_params`; the
//! composed subject and HTML body are passed along as parameters so a
//! generic template can display them.

use std::time::Duration;

use async_trait::async_trait;

use super::{EmailError, Mailer, OutgoingEmail};

/// Default endpoint of the hosted email service.
const DEFAULT_SERVICE_URL: &str = "https://api.emailjs.com/api/v1.0/email/send";

/// Retry delays in seconds for a single send (1 s, 2 s). The outbox
/// dispatcher retries failed messages on a much longer schedule.
const RETRY_DELAYS_SECS: [u64; 2] = [1, 2];

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for the HTTP email service.
#[derive(Debug, Clone)]
pub struct EmailServiceConfig {
    pub url: String,
    pub service_id: String,
    pub template_id: String,
    /// Public key, sent as `user_id`.
    pub public_key: String,
    /// Private key, sent as `accessToken` when present.
    pub private_key: Option<String>,
}

impl EmailServiceConfig {
    /// Load configuration from environment variables.
    ///
    /// Returns `None` unless `EMAIL_SERVICE_ID`, `EMAIL_TEMPLATE_ID` and
    /// `EMAIL_PUBLIC_KEY` are all set.
    ///
    /// | Variable             | Required | Default                    |
    /// |----------------------|----------|----------------------------|
    /// | `EMAIL_SERVICE_URL`  | no       | hosted `email/send` URL    |
    /// | `EMAIL_SERVICE_ID`   | yes      |                            |
    /// | `EMAIL_TEMPLATE_ID`  | yes      |                            |
    /// | `EMAIL_PUBLIC_KEY`   | yes      |                            |
    /// | `EMAIL_PRIVATE_KEY`  | no       |                            |
    pub fn from_env() -> Option<Self> {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());
        Some(Self {
            url: var("EMAIL_SERVICE_URL").unwrap_or_else(|| DEFAULT_SERVICE_URL.to_string()),
            service_id: var("EMAIL_SERVICE_ID")?,
            template_id: var("EMAIL_TEMPLATE_ID")?,
            public_key: var("EMAIL_PUBLIC_KEY")?,
            private_key: var("EMAIL_PRIVATE_KEY"),
        })
    }
}

/// Sends emails through the hosted email service.
pub struct EmailServiceMailer {
    config: EmailServiceConfig,
    client: reqwest::Client,
}

impl EmailServiceMailer {
    pub fn new(config: EmailServiceConfig) -> Result<Self, EmailError> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { config, client })
    }

    /// Request body for one email.
    fn payload(&self, email: &OutgoingEmail) -> serde_json::Value {
        let mut params = match &email.template_params {
            serde_json::Value::Object(map) => map.clone(),
            _ => serde_json::Map::new(),
        };
        params.insert("to_email".into(), email.to.clone().into());
        params.insert("subject".into(), email.subject.clone().into());
        params.insert("html_body".into(), email.html_body.clone().into());
        if let Some(reply_to) = &email.reply_to {
            params.insert("reply_to".into(), reply_to.clone().into());
        }

        let mut body = serde_json::json!({
            "service_id": self.config.service_id,
            "template_id": self.config.template_id,
            "user_id": self.config.public_key,
            "template_params": params,
        });
        if let Some(token) = &self.config.private_key {
            body["accessToken"] = token.clone().into();
        }
        body
    }

    async fn try_send(&self, payload: &serde_json::Value) -> Result<(), EmailError> {
        let response = self.client.post(&self.config.url).json(payload).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmailError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl Mailer for EmailServiceMailer {
    fn name(&self) -> &'static str {
        "email_service"
    }

    async fn send(&self, email: &OutgoingEmail) -> Result<(), EmailError> {
        let payload = self.payload(email);

        for (attempt, delay_secs) in RETRY_DELAYS_SECS.iter().enumerate() {
            match self.try_send(&payload).await {
                Ok(()) => {
                    tracing::info!(to = %email.to, "Email sent via email service");
                    return Ok(());
                }
                // A 4xx will not succeed on retry.
                Err(EmailError::HttpStatus { status, body }) if (400..500).contains(&status) => {
                    return Err(EmailError::HttpStatus { status, body });
                }
                Err(e) => {
                    tracing::warn!(
                        attempt = attempt + 1,
                        error = %e,
                        "Email service attempt failed, retrying"
                    );
                    tokio::time::sleep(Duration::from_secs(*delay_secs)).await;
                }
            }
        }

        self.try_send(&payload).await?;
        tracing::info!(to = %email.to, "Email sent via email service");
        Ok(())
    }
}
