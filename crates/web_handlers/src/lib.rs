//! # Web Handlers for the YelpCamp API
//!
//! Route handlers, the JSON error shape and the response views. Handlers
//! only translate HTTP to service calls; every rule lives in
//! `campground_services`.

use serde::de::DeserializeOwned;
use uuid::Uuid;

/// Campground CRUD handlers
mod campground_handlers;
pub use campground_handlers::*;

/// Review handlers
mod review_handlers;
pub use review_handlers::*;

/// Register, login, logout and current user
mod user_handlers;
pub use user_handlers::*;

/// Home page and health check
mod home_handlers;
pub use home_handlers::*;

pub mod error;
mod form_data;
pub mod routes;
pub mod state;
pub mod views;

pub use error::ApiError;
pub use routes::{configure, not_found, security_headers};
pub use state::{AppPorts, AppState};


/// Parses a path id. Anything that is not a UUID resolves to nothing, so
/// callers answer 404 rather than 500.
pub(crate) fn parse_id(raw: &str) -> Option<Uuid> {
    Uuid::parse_str(raw.trim()).ok()
}

/// Decodes a JSON body that was read as raw bytes
pub(crate) fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid request body: {}", e)))
}
