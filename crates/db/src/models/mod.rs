//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - `Deserialize` request DTOs for inserts and updates

pub mod breed;
pub mod event;
pub mod notification;
pub mod puppy;
pub mod reservation;
pub mod review;
pub mod session;
pub mod user;
