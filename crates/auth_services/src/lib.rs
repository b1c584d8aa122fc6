//! # Auth Services
//!
//! This crate provides authentication for the campground API.
//! It includes JWT token handling, bearer-token middleware, request
//! extractors for the signed-in user, and the bcrypt password hasher.

/// bcrypt implementation of the password hashing port.
pub mod hasher;
/// JWT token issuing and verification.
pub mod jwt;
/// Middleware for request authentication and the authenticated-user extractor.
pub mod middleware;
/// Types and structures used in authentication services.
pub mod types;

pub use hasher::BcryptHasher;
pub use jwt::JwtService;
pub use middleware::{AuthMiddleware, AuthenticatedUser};
pub use types::{AuthError, Claims};
