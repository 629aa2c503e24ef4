//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` (or a transaction executor) as the first argument.

pub mod breed_repo;
pub mod event_repo;
pub mod lifecycle_repo;
pub mod notification_repo;
pub mod puppy_repo;
pub mod reservation_repo;
pub mod review_repo;
pub mod session_repo;
pub mod user_repo;

pub use breed_repo::BreedRepo;
pub use event_repo::EventRepo;
pub use lifecycle_repo::{Actor, LifecycleRepo, TransitionError, TransitionOutcome};
pub use notification_repo::NotificationRepo;
pub use puppy_repo::{PuppyRepo, UpdateOutcome};
pub use reservation_repo::ReservationRepo;
pub use review_repo::ReviewRepo;
pub use session_repo::SessionRepo;
pub use user_repo::UserRepo;
