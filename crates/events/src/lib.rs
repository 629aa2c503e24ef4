//! GoldiPuppy event bus and notification delivery.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`PlatformEvent`]: the domain event envelope published after a
//!   lifecycle transition commits.
//! - [`delivery`]: email transports behind the [`Mailer`] trait.
//! - [`OutboxDispatcher`]: background service delivering queued
//!   notifications with retry.

pub mod bus;
pub mod delivery;
pub mod dispatcher;

pub use bus::{EventBus, PlatformEvent};
pub use delivery::email_service::{EmailServiceConfig, EmailServiceMailer};
pub use delivery::smtp::{SmtpConfig, SmtpMailer};
pub use delivery::{EmailError, Mailer, OutgoingEmail};
pub use dispatcher::OutboxDispatcher;
