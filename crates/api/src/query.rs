//! Shared query parameter types for API handlers.

use goldipuppy_core::types::DbId;
use serde::Deserialize;

/// `?id=<uuid>`, used by the delete endpoints that address a record by
/// query string rather than by path.
#[derive(Debug, Deserialize)]
pub struct IdParam {
    pub id: DbId,
}
