//! # Campground Services
//!
//! Domain model and application services for the campground directory:
//! campgrounds with geocoded locations and hosted images, user reviews,
//! registration and ownership checks. Storage and outbound services are
//! reached through the traits in [`ports`], so the services run unchanged
//! against Postgres or the bundled [`memory::InMemoryStore`].

/// Ownership checks for mutating operations.
pub mod authorization;
/// Campgrounds, reviews, users and their value types.
pub mod entities;
/// Error types shared by services and adapters.
pub mod error;
/// In-memory repository adapter.
pub mod memory;
/// Traits implemented by storage and outbound adapters.
pub mod ports;
/// Campground, review and user use cases.
pub mod services;
/// Request body schemas and their validation rules.
pub mod validation;

pub use authorization::{AccessError, OwnershipGuard};
pub use entities::*;
pub use error::*;
pub use services::{CampgroundService, ReviewService, UserService};
