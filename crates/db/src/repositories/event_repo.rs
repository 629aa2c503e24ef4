//! Repository for the `events` audit table.

use goldipuppy_core::types::DbId;
use sqlx::{PgExecutor, PgPool};

use crate::models::event::Event;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, event_type, entity_type, entity_id, actor_user_id, payload, created_at";

/// Provides insert and query operations for audit events.
pub struct EventRepo;

impl EventRepo {
    /// Insert an event row, returning its id.
    ///
    /// Accepts any executor so lifecycle transactions can record the event
    /// atomically with the state change.
    pub async fn insert<'e, E: PgExecutor<'e>>(
        executor: E,
        event_type: &str,
        entity_type: Option<&str>,
        entity_id: Option<DbId>,
        actor_user_id: Option<DbId>,
        payload: &serde_json::Value,
    ) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO events (event_type, entity_type, entity_id, actor_user_id, payload)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id",
        )
        .bind(event_type)
        .bind(entity_type)
        .bind(entity_id)
        .bind(actor_user_id)
        .bind(payload)
        .fetch_one(executor)
        .await
    }

    /// List events for one entity, newest first.
    pub async fn list_for_entity(
        pool: &PgPool,
        entity_type: &str,
        entity_id: DbId,
    ) -> Result<Vec<Event>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM events
             WHERE entity_type = $1 AND entity_id = $2
             ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, Event>(&query)
            .bind(entity_type)
            .bind(entity_id)
            .fetch_all(pool)
            .await
    }
}
