pub mod auth;
pub mod breeds;
pub mod contact;
pub mod lifecycle;
pub mod puppies;
pub mod reservations;
pub mod reviews;
pub mod uploads;
