use std::sync::Arc;

use goldipuppy_events::{EventBus, Mailer};

use crate::config::ServerConfig;
use crate::storage::ImageStore;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: inner data is behind `Arc` or is already `Clone`.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: goldipuppy_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Lifecycle events are published here after commit.
    pub event_bus: Arc<EventBus>,
    /// SMTP relay for contact-form mail; `None` when not configured.
    pub contact_mailer: Option<Arc<dyn Mailer>>,
    /// Uploaded listing images.
    pub images: Arc<dyn ImageStore>,
}
