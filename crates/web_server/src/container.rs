//! Composition root: the only place that knows which adapter backs each port.

use std::sync::Arc;

use anyhow::Context;
use sqlx::PgPool;

use auth_services::{BcryptHasher, JwtService};
use external_services::{CloudinaryImageStore, MapboxGeocoder};
use postgres::{PgCampgroundRepository, PgHealth, PgReviewRepository, PgUserRepository};
use web_handlers::{AppPorts, AppState};

use crate::config::AppConfig;

/// Wires the PostgreSQL repositories and the outbound HTTP adapters into the
/// handler state
pub fn build_state(config: &AppConfig, pool: PgPool) -> anyhow::Result<AppState> {
    if config.mapbox_token.is_empty() {
        log::warn!("MAPBOX_TOKEN is not set, creating campgrounds will fail");
    }

    let geocoder = MapboxGeocoder::new(config.mapbox_token.clone())
        .context("Failed to build the geocoding client")?;
    let images = CloudinaryImageStore::new(config.cloudinary.clone())
        .context("Failed to build the image store client")?;

    let ports = AppPorts {
        campgrounds: Arc::new(PgCampgroundRepository::new(pool.clone())),
        reviews: Arc::new(PgReviewRepository::new(pool.clone())),
        users: Arc::new(PgUserRepository::new(pool.clone())),
        hasher: Arc::new(BcryptHasher::new()),
        geocoder: Arc::new(geocoder),
        images: Arc::new(images),
        health: Arc::new(PgHealth::new(pool)),
    };

    Ok(AppState::new(
        ports,
        JwtService::new(&config.jwt_secret),
        config.environment.as_str(),
    ))
}
