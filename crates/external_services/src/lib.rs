//! # External Services
//!
//! Outbound adapters for the campground services: forward geocoding through
//! the Mapbox Geocoding API and signed image uploads and deletes through the
//! Cloudinary upload API.

/// Cloudinary image store client.
mod cloudinary;
/// Mapbox forward geocoding client.
mod mapbox;

pub use cloudinary::*;
pub use mapbox::*;
