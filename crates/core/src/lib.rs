//! Domain logic for the GoldiPuppy storefront.
//!
//! Everything in this crate is pure: no database, no network. The DB and
//! API layers call into these modules for state-machine decisions,
//! deposit math, validation and catalog filtering.

pub mod catalog;
pub mod contact;
pub mod deposit;
pub mod error;
pub mod images;
pub mod lifecycle;
pub mod review;
pub mod roles;
pub mod storage;
pub mod types;
