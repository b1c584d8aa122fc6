//! # Postgres
//!
//! PostgreSQL adapters for the campground services: connection pool,
//! migrations and one repository per aggregate.

mod campground_repository;
/// Connection pool, migrations and the health check.
pub mod database;
mod review_repository;
mod rows;
mod user_repository;

pub use campground_repository::PgCampgroundRepository;
pub use database::{PgHealth, create_connection_pool, run_migrations};
pub use review_repository::PgReviewRepository;
pub use user_repository::PgUserRepository;
